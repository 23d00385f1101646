//! Entry points used by the chat layer and the periodic driver.
//!
//! Every mutation is persisted before the call returns; a failed save is
//! returned to the caller.

use std::sync::Arc;

use chrono::NaiveDateTime;
use parkwatch_schedule::models::GeoPosition;
use parkwatch_schedule::provider::{RefreshReport, ScheduleStore};
use parkwatch_schedule::spatial::ZoneMatch;
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::reminder::{evaluate, MaintenanceAction, ReminderInputs, TickOutcome};
use crate::settings::Settings;
use crate::state::{Favorites, ParkedVehicle, StateStore};

#[derive(Clone, Debug)]
pub struct ParkingReport {
    pub vehicle: ParkedVehicle,
    pub matched: Option<ZoneMatch>,
}

pub struct Monitor {
    schedule: Arc<ScheduleStore>,
    state: StateStore,
}

impl Monitor {
    pub fn new(schedule: Arc<ScheduleStore>, state: StateStore) -> Self {
        Self { schedule, state }
    }

    pub fn schedule(&self) -> &ScheduleStore {
        &self.schedule
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Match `position` against the current schedule and record the vehicle there
    pub fn report_location(&self, position: GeoPosition, now: NaiveDateTime) -> Result<ParkingReport> {
        let settings = self.state.load_settings()?;
        let zones = self.schedule.snapshot();
        let matched = zones.match_point(position.to_point(), settings.max_distance_meters);
        let vehicle = ParkedVehicle::new(position, matched.as_ref(), now);

        let mut parking = self.state.load_parking()?;
        parking.park(vehicle.clone());
        self.state.save_parking(&parking)?;

        match &matched {
            Some(found) => info!(
                zone = %found.zone.key(),
                distance_m = found.distance_m,
                next_cleaning = ?vehicle.next_cleaning,
                "Vehicle parked in a cleaning zone"
            ),
            None => info!("Vehicle parked outside any cleaning zone"),
        }
        Ok(ParkingReport { vehicle, matched })
    }

    pub fn clear_parking(&self) -> Result<bool> {
        let mut parking = self.state.load_parking()?;
        if !parking.clear() {
            return Ok(false);
        }
        self.state.save_parking(&parking)?;
        Ok(true)
    }

    pub fn favorites(&self) -> Result<Favorites> {
        self.state.load_favorites()
    }

    pub fn add_favorite(
        &self,
        name: &str,
        description: Option<String>,
        now: NaiveDateTime,
    ) -> Result<bool> {
        let mut favorites = self.state.load_favorites()?;
        if !favorites.add(name, description, now) {
            return Ok(false);
        }
        self.state.save_favorites(&favorites)?;
        Ok(true)
    }

    pub fn remove_favorite(&self, name: &str) -> Result<bool> {
        let mut favorites = self.state.load_favorites()?;
        if !favorites.remove(name) {
            return Ok(false);
        }
        self.state.save_favorites(&favorites)?;
        Ok(true)
    }

    /// Evaluate reminders at `now` and run the maintenance that is due.
    ///
    /// Reminders are computed against the snapshot in place when the tick
    /// starts. The returned notifications are not marked as sent until
    /// [`Monitor::acknowledge`] is called.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<TickOutcome> {
        let settings = self.state.load_settings()?;
        let mut parking = self.state.load_parking()?;
        let favorites = self.state.load_favorites()?;
        let scheduler = self.state.load_scheduler()?;
        let zones = self.schedule.snapshot();

        let outcome = evaluate(
            now,
            &ReminderInputs {
                parking: &parking,
                favorites: &favorites,
                settings: &settings,
                zones: &zones,
                scheduler: &scheduler,
            },
        );

        if outcome.wants(MaintenanceAction::ExpireParking) && parking.clear() {
            self.state.save_parking(&parking)?;
            info!("Cleared parking after its cleaning date passed");
        }

        if outcome.wants(MaintenanceAction::RefreshSchedule) {
            match self.refresh_schedule(now).await {
                // Already recorded; the next tick retries
                Ok(_) | Err(CoreError::Schedule(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    /// Download the schedule now and record the attempt in the refresh status.
    ///
    /// A failed download is counted and saved before its error is returned.
    pub async fn refresh_schedule(&self, now: NaiveDateTime) -> Result<RefreshReport> {
        let result = self.schedule.refresh().await;

        let mut scheduler = self.state.load_scheduler()?;
        match &result {
            Ok(report) => scheduler.refresh.record_success(now, report.loaded),
            Err(e) => {
                scheduler.refresh.record_failure(now);
                warn!(
                    error = %e,
                    failures = scheduler.refresh.consecutive_failures,
                    "Schedule refresh failed"
                );
            }
        }
        self.state.save_scheduler(&scheduler)?;

        Ok(result?)
    }

    pub fn settings(&self) -> Result<Settings> {
        self.state.load_settings()
    }

    /// Apply `change` to the stored settings and save the result.
    ///
    /// Out-of-range values are reset to their defaults before saving; the
    /// names of the reset fields are returned with the saved settings.
    pub fn update_settings(
        &self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<(Settings, Vec<&'static str>)> {
        let mut settings = self.state.load_settings()?;
        change(&mut settings);
        let reset = settings.sanitize();
        self.state.save_settings(&settings)?;

        info!(settings = ?settings, "Settings updated");
        Ok((settings, reset))
    }

    /// Record the notifications of `outcome` as delivered
    pub fn acknowledge(&self, outcome: &TickOutcome, now: NaiveDateTime) -> Result<()> {
        let mut scheduler = self.state.load_scheduler()?;
        outcome.apply_markers(&mut scheduler, now.date());
        self.state.save_scheduler(&scheduler)
    }
}
