use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use parkwatch_core::{Monitor, Settings, StateStore, TickOutcome};
use parkwatch_schedule::models::GeoPosition;
use parkwatch_schedule::network::HttpFetcher;
use parkwatch_schedule::overrides::OverrideSet;
use parkwatch_schedule::provider::ScheduleStore;
use tracing::{error, info, warn};

use crate::config::AppConfig;

pub struct App {
    monitor: Monitor,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl App {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let overrides = OverrideSet::load(&config.paths.overrides_file)
            .context("Failed to load override rules")?;
        let fetcher = HttpFetcher::new(config.http_timeout()).context("Failed to set up HTTP client")?;
        let schedule = ScheduleStore::new(config.store_config(), Arc::new(fetcher), overrides);
        let state = StateStore::new(&config.paths.state_dir).with_default_settings(config.parking.clone());

        Ok(Self {
            monitor: Monitor::new(Arc::new(schedule), state),
        })
    }

    /// Load the schedule from cache or network; an empty schedule is not fatal.
    async fn load_schedule(&self) {
        match self.monitor.schedule().bootstrap().await {
            Ok(report) => info!(zones = report.loaded, source = ?report.source, "Schedule ready"),
            Err(e) => warn!(error = %e, "No schedule loaded, matching will find nothing"),
        }
    }

    pub async fn run(&self, config: &AppConfig) -> Result<()> {
        config.require_source()?;
        info!("=== parkwatch ===");
        self.load_schedule().await;

        let mut interval = tokio::time::interval(config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let at = now();
                    if let Err(e) = self.tick_and_deliver(at, false).await {
                        error!(error = %e, "Tick failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    return Ok(());
                }
            }
        }
    }

    pub async fn tick_once(
        &self,
        config: &AppConfig,
        at: Option<NaiveDateTime>,
        dry_run: bool,
    ) -> Result<()> {
        config.require_source()?;
        self.load_schedule().await;

        let outcome = self.tick_and_deliver(at.unwrap_or_else(now), dry_run).await?;
        if outcome.notifications.is_empty() {
            println!("Nothing due");
        }
        Ok(())
    }

    async fn tick_and_deliver(&self, at: NaiveDateTime, dry_run: bool) -> Result<TickOutcome> {
        let outcome = self.monitor.tick(at).await.context("Reminder tick failed")?;

        for notification in &outcome.notifications {
            println!("{notification}");
        }
        if !dry_run && !outcome.notifications.is_empty() {
            self.monitor
                .acknowledge(&outcome, at)
                .context("Failed to record sent reminders")?;
        }
        Ok(outcome)
    }

    pub async fn refresh(&self, config: &AppConfig) -> Result<()> {
        config.require_source()?;
        let report = self
            .monitor
            .refresh_schedule(now())
            .await
            .context("Schedule refresh failed")?;

        println!(
            "Loaded {} zones ({} records skipped, {} excluded by overrides)",
            report.loaded, report.skipped, report.excluded
        );
        Ok(())
    }

    pub async fn show_matches(&self, lat: f64, lon: f64, radius: Option<f64>) -> Result<()> {
        self.load_schedule().await;
        let settings = self.monitor.state().load_settings()?;
        let radius = radius.unwrap_or(settings.max_distance_meters);
        let position = GeoPosition::new(lat, lon);
        let today = now().date();

        let zones = self.monitor.schedule().snapshot();
        let nearby = zones.zones_near(position.to_point(), radius);
        if nearby.is_empty() {
            println!("No cleaning zone within {radius} m");
            return Ok(());
        }

        for found in nearby {
            let next = found
                .zone
                .next_cleaning(today)
                .map_or_else(|| "unknown".to_string(), |date| date.to_string());
            println!("{:>6.1} m  {}  next: {}", found.distance_m, found.zone.key(), next);
        }
        Ok(())
    }

    pub async fn park(&self, lat: f64, lon: f64) -> Result<()> {
        self.load_schedule().await;
        let report = self.monitor.report_location(GeoPosition::new(lat, lon), now())?;

        match (&report.matched, report.vehicle.next_cleaning) {
            (Some(found), Some(date)) => println!(
                "Parked on {} ({:.0} m), next cleaning {}",
                found.zone.key(),
                found.distance_m,
                date
            ),
            (Some(found), None) => println!("Parked on {}, no upcoming cleaning", found.zone.key()),
            (None, _) => println!("Parked outside any cleaning zone"),
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.monitor.clear_parking()? {
            println!("Parking cleared");
        } else {
            println!("Nothing was parked");
        }
        Ok(())
    }

    pub fn list_favorites(&self) -> Result<()> {
        let favorites = self.monitor.favorites()?;
        if favorites.is_empty() {
            println!("No favorite streets");
        }
        for favorite in favorites.iter() {
            match &favorite.description {
                Some(description) => println!("{} ({})", favorite.name, description),
                None => println!("{}", favorite.name),
            }
        }
        Ok(())
    }

    pub fn add_favorite(&self, name: &str, description: Option<String>) -> Result<()> {
        if self.monitor.add_favorite(name, description, now())? {
            println!("Added {name}");
        } else {
            println!("{name} is already a favorite");
        }
        Ok(())
    }

    pub fn remove_favorite(&self, name: &str) -> Result<()> {
        if self.monitor.remove_favorite(name)? {
            println!("Removed {name}");
        } else {
            println!("{name} is not a favorite");
        }
        Ok(())
    }

    /// Print the settings after applying `change`; a no-op change only prints
    pub fn settings(&self, change: SettingsChange) -> Result<()> {
        let settings = if change.is_empty() {
            self.monitor.settings()?
        } else {
            let (saved, reset) = self
                .monitor
                .update_settings(|settings| change.apply(settings))
                .context("Failed to save settings")?;
            for field in reset {
                println!("Invalid {field}, kept the default");
            }
            saved
        };

        println!("max_distance_meters: {}", settings.max_distance_meters);
        println!("reminder_hours: {:?}", settings.reminder_hours);
        println!("warning_days_advance: {}", settings.warning_days_advance);
        println!("refresh_interval_hours: {}", settings.refresh_interval_hours);
        println!("favorites_check_hour: {}", settings.favorites_check_hour);
        println!("notifications_enabled: {}", settings.notifications_enabled);
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let state = self.monitor.state();
        let parking = state.load_parking()?;
        let scheduler = state.load_scheduler()?;
        let settings = state.load_settings()?;

        match &parking.current {
            Some(vehicle) => {
                let zone = vehicle
                    .matched_zone
                    .as_ref()
                    .map_or_else(|| "no cleaning zone".to_string(), ToString::to_string);
                println!("Parked since {}: {}", vehicle.parked_at, zone);
                if let Some(date) = vehicle.next_cleaning {
                    println!("Next cleaning: {date}");
                }
            }
            None => println!("Not parked"),
        }
        println!("Parking history: {} entries", parking.history.len());
        println!("Favorites: {}", self.monitor.favorites()?.len());

        let refresh = &scheduler.refresh;
        match refresh.last_success {
            Some(at) => println!("Schedule: {} zones, refreshed {}", refresh.zone_count, at),
            None => println!("Schedule: never refreshed"),
        }
        if refresh.consecutive_failures > 0 {
            println!("Refresh failures since last success: {}", refresh.consecutive_failures);
        }
        println!(
            "Reminders at {:?}, favorites at {}:00, match distance {} m{}",
            settings.reminder_hours,
            settings.favorites_check_hour,
            settings.max_distance_meters,
            if settings.notifications_enabled { "" } else { " (notifications off)" }
        );
        Ok(())
    }
}

/// Settings fields given on the command line; `None` keeps the stored value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsChange {
    pub max_distance_meters: Option<f64>,
    pub reminder_hours: Option<Vec<u32>>,
    pub warning_days_advance: Option<u32>,
    pub refresh_interval_hours: Option<u32>,
    pub favorites_check_hour: Option<u32>,
    pub notifications_enabled: Option<bool>,
}

impl SettingsChange {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, settings: &mut Settings) {
        if let Some(distance) = self.max_distance_meters {
            settings.max_distance_meters = distance;
        }
        if let Some(hours) = self.reminder_hours {
            settings.reminder_hours = hours;
        }
        if let Some(days) = self.warning_days_advance {
            settings.warning_days_advance = days;
        }
        if let Some(hours) = self.refresh_interval_hours {
            settings.refresh_interval_hours = hours;
        }
        if let Some(hour) = self.favorites_check_hour {
            settings.favorites_check_hour = hour;
        }
        if let Some(enabled) = self.notifications_enabled {
            settings.notifications_enabled = enabled;
        }
    }
}
