use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::SettingsChange;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "parkwatch",
    author,
    version,
    about = "Street-cleaning parking reminders for Florence",
    long_about = "Matches a parked car's position against the municipal street-cleaning \
                  schedule and reports when the street is about to be cleaned.\n\n\
                  `run` keeps the schedule fresh and evaluates reminders on a fixed \
                  cadence; the other commands act on the saved state once."
)]
struct Args {
    /// YAML config file (default: config/config.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh and evaluate reminders until interrupted
    Run,

    /// Evaluate reminders once
    Tick {
        /// Local time to evaluate at, e.g. 2024-05-15T08:00 (default: now)
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,

        /// Do not mark printed reminders as sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Download the schedule now
    Refresh,

    /// Show the cleaning zones near a position without parking there
    Match {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in meters (default: the configured match distance)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Record the vehicle as parked at a position
    Park {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Forget the current parking position
    Clear,

    /// Manage monitored streets
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Show the stored settings, changing the given ones first
    Settings {
        /// Street matching distance in meters
        #[arg(long)]
        distance: Option<f64>,
        /// Local hours for parking reminders, e.g. 8,20
        #[arg(long, value_delimiter = ',')]
        reminder_hours: Option<Vec<u32>>,
        /// Days ahead from which info reminders start
        #[arg(long)]
        warning_days: Option<u32>,
        #[arg(long)]
        refresh_hours: Option<u32>,
        /// Local hour of the daily favorites check
        #[arg(long)]
        favorites_hour: Option<u32>,
        #[arg(long)]
        notifications: Option<bool>,
    },

    /// Show parking, favorites and refresh status
    Status,
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    List,
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    Remove {
        name: String,
    },
}

fn parse_local_time(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM, got {raw:?}"))
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let ours = FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("parkwatch"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(ours)
        .with(level)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let app = commands::App::open(&config)?;

    match args.command {
        Command::Run => app.run(&config).await,
        Command::Tick { at, dry_run } => app.tick_once(&config, at, dry_run).await,
        Command::Refresh => app.refresh(&config).await,
        Command::Match { lat, lon, radius } => app.show_matches(lat, lon, radius).await,
        Command::Park { lat, lon } => app.park(lat, lon).await,
        Command::Clear => app.clear(),
        Command::Favorites { action } => match action.unwrap_or(FavoritesAction::List) {
            FavoritesAction::List => app.list_favorites(),
            FavoritesAction::Add { name, description } => app.add_favorite(&name, description),
            FavoritesAction::Remove { name } => app.remove_favorite(&name),
        },
        Command::Settings {
            distance,
            reminder_hours,
            warning_days,
            refresh_hours,
            favorites_hour,
            notifications,
        } => app.settings(SettingsChange {
            max_distance_meters: distance,
            reminder_hours,
            warning_days_advance: warning_days,
            refresh_interval_hours: refresh_hours,
            favorites_check_hour: favorites_hour,
            notifications_enabled: notifications,
        }),
        Command::Status => app.status(),
    }
}
