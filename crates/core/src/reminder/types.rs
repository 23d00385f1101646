use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use parkwatch_schedule::identifiers::ZoneKey;
use parkwatch_schedule::models::TimeWindow;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Urgent,
}

impl Severity {
    /// Tier for a cleaning `days_until` away.
    ///
    /// `None` for past dates and for dates beyond `warning_days_advance`.
    pub fn for_days_until(days_until: i64, warning_days_advance: u32) -> Option<Self> {
        match days_until {
            0 => Some(Self::Urgent),
            1 => Some(Self::Warning),
            d if d >= 2 && d <= i64::from(warning_days_advance) => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Urgent => "urgent",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationTarget {
    /// The currently parked vehicle
    Parking,
    /// A favorite street, by the name the user saved
    Favorite(String),
}

impl NotificationTarget {
    /// Key of the idempotency marker for this target
    pub fn marker_key(&self) -> String {
        match self {
            Self::Parking => "parking".to_string(),
            Self::Favorite(name) => format!("favorite:{}", name.trim().to_uppercase()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub target: NotificationTarget,
    pub zone: ZoneKey,
    pub severity: Severity,
    pub date: NaiveDate,
    pub days_until: i64,
    pub time_window: Option<TimeWindow>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = match self.days_until {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            d => format!("in {d} days"),
        };
        write!(f, "[{}] {} cleaning {} ({})", self.severity, self.zone, when, self.date)?;
        if let Some(window) = &self.time_window {
            write!(f, " {window}")?;
        }
        if let NotificationTarget::Favorite(name) = &self.target {
            write!(f, " for favorite {name}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaintenanceAction {
    RefreshSchedule,
    /// The parked vehicle's cleaning date has passed
    ExpireParking,
}

/// Last notification sent for a target
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMarker {
    /// Zone the notification was about
    pub zone: ZoneKey,
    pub date: NaiveDate,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshStatus {
    pub last_success: Option<NaiveDateTime>,
    pub last_attempt: Option<NaiveDateTime>,
    pub consecutive_failures: u32,
    pub zone_count: usize,
}

impl RefreshStatus {
    /// Never refreshed, or the last success is at least `interval_hours` old
    pub fn is_due(&self, now: NaiveDateTime, interval_hours: u32) -> bool {
        match self.last_success {
            None => true,
            Some(last) => now - last >= TimeDelta::hours(i64::from(interval_hours)),
        }
    }

    pub fn record_success(&mut self, now: NaiveDateTime, zone_count: usize) {
        self.last_success = Some(now);
        self.last_attempt = Some(now);
        self.consecutive_failures = 0;
        self.zone_count = zone_count;
    }

    pub fn record_failure(&mut self, now: NaiveDateTime) {
        self.last_attempt = Some(now);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Scheduler bookkeeping persisted between ticks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerState {
    pub markers: BTreeMap<String, NotificationMarker>,
    pub refresh: RefreshStatus,
}

impl SchedulerState {
    /// Whether `notification` repeats the marker stored for its target:
    /// same zone, same cleaning date, same severity.
    pub fn already_sent(&self, notification: &Notification) -> bool {
        self.markers
            .get(&notification.target.marker_key())
            .is_some_and(|marker| {
                marker.zone == notification.zone
                    && marker.date == notification.date
                    && marker.severity == notification.severity
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub notifications: Vec<Notification>,
    pub actions: Vec<MaintenanceAction>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.actions.is_empty()
    }

    pub fn wants(&self, action: MaintenanceAction) -> bool {
        self.actions.contains(&action)
    }

    /// Store a marker for every delivered notification and drop markers
    /// whose cleaning date is before `today`.
    pub fn apply_markers(&self, state: &mut SchedulerState, today: NaiveDate) {
        for notification in &self.notifications {
            state.markers.insert(
                notification.target.marker_key(),
                NotificationMarker {
                    zone: notification.zone.clone(),
                    date: notification.date,
                    severity: notification.severity,
                },
            );
        }
        state.markers.retain(|_, marker| marker.date >= today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::for_days_until(0, 2), Some(Severity::Urgent));
        assert_eq!(Severity::for_days_until(1, 2), Some(Severity::Warning));
        assert_eq!(Severity::for_days_until(2, 2), Some(Severity::Info));
        assert_eq!(Severity::for_days_until(3, 2), None);
        assert_eq!(Severity::for_days_until(5, 6), Some(Severity::Info));
        assert_eq!(Severity::for_days_until(-1, 2), None);
        // A one-day advance never produces info
        assert_eq!(Severity::for_days_until(2, 1), None);
    }

    #[test]
    fn test_refresh_due_arithmetic() {
        let mut status = RefreshStatus::default();
        assert!(status.is_due(at(15, 8), 24));

        status.record_success(at(15, 8), 1200);
        assert!(!status.is_due(at(16, 7), 24));
        assert!(status.is_due(at(16, 8), 24));

        status.record_failure(at(16, 8));
        status.record_failure(at(16, 9));
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_success, Some(at(15, 8)));
        assert_eq!(status.zone_count, 1200);
        // Still due: failures do not move the success clock
        assert!(status.is_due(at(16, 10), 24));
    }

    #[test]
    fn test_marker_keys_ignore_favorite_case() {
        assert_eq!(
            NotificationTarget::Favorite("Via Maggio ".into()).marker_key(),
            NotificationTarget::Favorite("VIA MAGGIO".into()).marker_key()
        );
        assert_ne!(
            NotificationTarget::Parking.marker_key(),
            NotificationTarget::Favorite("parking".into()).marker_key()
        );
    }
}
