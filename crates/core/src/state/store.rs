//! One JSON snapshot file per record, all under a single state directory.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::reminder::SchedulerState;
use crate::settings::Settings;
use crate::state::snapshot::{load_json, save_json};
use crate::state::{Favorites, ParkingState};

const PARKING_FILE: &str = "parking.json";
const FAVORITES_FILE: &str = "favorites.json";
const SETTINGS_FILE: &str = "settings.json";
const SCHEDULER_FILE: &str = "scheduler.json";

#[derive(Clone, Debug)]
pub struct StateStore {
    dir: PathBuf,
    /// Used when no settings file has been written yet
    default_settings: Settings,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_settings: Settings::default(),
        }
    }

    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_parking(&self) -> Result<ParkingState> {
        load_json(&self.dir.join(PARKING_FILE))
    }

    pub fn save_parking(&self, parking: &ParkingState) -> Result<()> {
        save_json(&self.dir.join(PARKING_FILE), parking)
    }

    pub fn load_favorites(&self) -> Result<Favorites> {
        load_json(&self.dir.join(FAVORITES_FILE))
    }

    pub fn save_favorites(&self, favorites: &Favorites) -> Result<()> {
        save_json(&self.dir.join(FAVORITES_FILE), favorites)
    }

    /// Stored settings with invalid fields reset to defaults
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.dir.join(SETTINGS_FILE);
        let mut settings: Settings = if path.exists() {
            load_json(&path)?
        } else {
            self.default_settings.clone()
        };
        settings.sanitize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        save_json(&self.dir.join(SETTINGS_FILE), settings)
    }

    pub fn load_scheduler(&self) -> Result<SchedulerState> {
        load_json(&self.dir.join(SCHEDULER_FILE))
    }

    pub fn save_scheduler(&self, scheduler: &SchedulerState) -> Result<()> {
        save_json(&self.dir.join(SCHEDULER_FILE), scheduler)
    }
}
