use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parkwatch_core::Settings;
use parkwatch_schedule::provider::StoreConfig;
use serde::Deserialize;

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "config/config.yaml";

const CACHE_FILE_NAME: &str = "pulizia_strade.kml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub open_data: OpenDataConfig,
    /// Defaults for the user settings until they are saved in the state dir
    pub parking: Settings,
    pub paths: PathsConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenDataConfig {
    pub kml_url: String,
    pub timeout_secs: u64,
    /// A cached download younger than this skips the startup fetch
    pub cache_max_age_hours: u64,
}

impl Default for OpenDataConfig {
    fn default() -> Self {
        Self {
            kml_url: String::new(),
            timeout_secs: 30,
            cache_max_age_hours: 24,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub overrides_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "state".into(),
            cache_dir: "data".into(),
            overrides_file: "config/overrides.yaml".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub tick_interval_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load `explicit` (which must exist), else the default file if present,
    /// else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file does not exist: {}", path.display());
                }
                path
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => {
                tracing::info!("No config file, using defaults");
                return Ok(Self::default());
            }
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(text)?;
        config.parking.sanitize();
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            source_url: self.open_data.kml_url.clone(),
            cache_path: Some(self.paths.cache_dir.join(CACHE_FILE_NAME)),
            cache_max_age: Duration::from_secs(self.open_data.cache_max_age_hours * 3600),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.open_data.timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.driver.tick_interval_secs.max(1))
    }

    /// Fail early for commands that need to download the schedule
    pub fn require_source(&self) -> Result<()> {
        let url = self.open_data.kml_url.trim();
        if url.is_empty() || url.to_uppercase().contains("YOUR_") {
            bail!("open_data.kml_url is not configured");
        }
        Ok(())
    }
}
