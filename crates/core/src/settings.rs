//! User-facing scheduling settings.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 20.0;
pub const DEFAULT_REMINDER_HOURS: [u32; 2] = [8, 20];
pub const DEFAULT_WARNING_DAYS_ADVANCE: u32 = 2;
pub const DEFAULT_REFRESH_INTERVAL_HOURS: u32 = 24;
pub const DEFAULT_FAVORITES_CHECK_HOUR: u32 = 12;

/// Longest reminder lead time accepted, in days
const MAX_WARNING_DAYS_ADVANCE: u32 = 6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Street matcher threshold
    pub max_distance_meters: f64,
    /// Local hours at which parking reminders are evaluated
    pub reminder_hours: Vec<u32>,
    /// Days before cleaning from which info reminders start
    pub warning_days_advance: u32,
    pub refresh_interval_hours: u32,
    /// Local hour of the daily favorite-street check
    pub favorites_check_hour: u32,
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_distance_meters: DEFAULT_MAX_DISTANCE_METERS,
            reminder_hours: DEFAULT_REMINDER_HOURS.to_vec(),
            warning_days_advance: DEFAULT_WARNING_DAYS_ADVANCE,
            refresh_interval_hours: DEFAULT_REFRESH_INTERVAL_HOURS,
            favorites_check_hour: DEFAULT_FAVORITES_CHECK_HOUR,
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Reset out-of-range fields to their defaults, logging each one.
    ///
    /// Returns the names of the fields that were reset.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut reset = Vec::new();

        if !self.max_distance_meters.is_finite() || self.max_distance_meters <= 0.0 {
            warn!(value = self.max_distance_meters, "Invalid max_distance_meters, using default");
            self.max_distance_meters = DEFAULT_MAX_DISTANCE_METERS;
            reset.push("max_distance_meters");
        }

        let before = self.reminder_hours.len();
        self.reminder_hours.retain(|hour| *hour < 24);
        self.reminder_hours.sort_unstable();
        self.reminder_hours.dedup();
        if self.reminder_hours.len() != before || self.reminder_hours.is_empty() {
            if self.reminder_hours.is_empty() {
                self.reminder_hours = DEFAULT_REMINDER_HOURS.to_vec();
            }
            warn!(hours = ?self.reminder_hours, "Dropped invalid or duplicate reminder hours");
            reset.push("reminder_hours");
        }

        if self.warning_days_advance > MAX_WARNING_DAYS_ADVANCE {
            warn!(value = self.warning_days_advance, "warning_days_advance too large, using default");
            self.warning_days_advance = DEFAULT_WARNING_DAYS_ADVANCE;
            reset.push("warning_days_advance");
        }

        if self.refresh_interval_hours == 0 {
            warn!("refresh_interval_hours must be at least 1, using default");
            self.refresh_interval_hours = DEFAULT_REFRESH_INTERVAL_HOURS;
            reset.push("refresh_interval_hours");
        }

        if self.favorites_check_hour >= 24 {
            warn!(value = self.favorites_check_hour, "Invalid favorites_check_hour, using default");
            self.favorites_check_hour = DEFAULT_FAVORITES_CHECK_HOUR;
            reset.push("favorites_check_hour");
        }

        reset
    }

    pub fn is_reminder_hour(&self, hour: u32) -> bool {
        self.reminder_hours.contains(&hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"max_distance_meters": 35.0}"#).unwrap();
        assert_eq!(settings.max_distance_meters, 35.0);
        assert_eq!(settings.reminder_hours, vec![8, 20]);
        assert_eq!(settings.warning_days_advance, 2);
        assert_eq!(settings.refresh_interval_hours, 24);
        assert_eq!(settings.favorites_check_hour, 12);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn test_sanitize_resets_only_bad_fields() {
        let mut settings = Settings {
            max_distance_meters: -3.0,
            reminder_hours: vec![20, 8, 20, 27],
            warning_days_advance: 3,
            refresh_interval_hours: 0,
            favorites_check_hour: 12,
            notifications_enabled: false,
        };

        let reset = settings.sanitize();

        assert_eq!(
            reset,
            vec!["max_distance_meters", "reminder_hours", "refresh_interval_hours"]
        );
        assert_eq!(settings.max_distance_meters, 20.0);
        assert_eq!(settings.reminder_hours, vec![8, 20]);
        assert_eq!(settings.warning_days_advance, 3);
        assert_eq!(settings.refresh_interval_hours, 24);
        assert!(!settings.notifications_enabled);
    }

    #[test]
    fn test_sanitize_keeps_valid_settings() {
        let mut settings = Settings::default();
        assert!(settings.sanitize().is_empty());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_empty_reminder_hours_fall_back() {
        let mut settings = Settings {
            reminder_hours: Vec::new(),
            ..Settings::default()
        };
        assert_eq!(settings.sanitize(), vec!["reminder_hours"]);
        assert!(settings.is_reminder_hour(8));
        assert!(!settings.is_reminder_hour(9));
    }
}
