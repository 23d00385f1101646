//! Reminder decision function.
//!
//! `evaluate` reads a consistent view of everything it needs and returns
//! what is due at `now`. It performs no IO; the caller delivers the
//! notifications, runs the maintenance actions and persists the markers.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use parkwatch_schedule::identifiers::ZoneKey;
use parkwatch_schedule::models::Recurrence;
use parkwatch_schedule::provider::ZoneIndex;
use tracing::debug;

use crate::reminder::types::{
    MaintenanceAction, Notification, NotificationTarget, SchedulerState, Severity, TickOutcome,
};
use crate::settings::Settings;
use crate::state::{Favorites, ParkingState};

pub struct ReminderInputs<'a> {
    pub parking: &'a ParkingState,
    pub favorites: &'a Favorites,
    pub settings: &'a Settings,
    pub zones: &'a ZoneIndex,
    pub scheduler: &'a SchedulerState,
}

pub fn evaluate(now: NaiveDateTime, inputs: &ReminderInputs) -> TickOutcome {
    let today = now.date();
    let hour = now.hour();
    let settings = inputs.settings;
    let mut outcome = TickOutcome::default();

    if inputs.scheduler.refresh.is_due(now, settings.refresh_interval_hours) {
        outcome.actions.push(MaintenanceAction::RefreshSchedule);
    }

    let mut parking_expired = false;
    if let Some(vehicle) = &inputs.parking.current {
        if vehicle.next_cleaning.is_some_and(|date| date < today) {
            debug!(parked_at = %vehicle.parked_at, "Parking outlived its cleaning date");
            outcome.actions.push(MaintenanceAction::ExpireParking);
            parking_expired = true;
        }
    }

    if !settings.notifications_enabled {
        return outcome;
    }

    if settings.is_reminder_hour(hour) && !parking_expired {
        let zone = inputs
            .parking
            .current
            .as_ref()
            .and_then(|vehicle| vehicle.matched_zone.as_ref());
        if let Some(key) = zone {
            if let Some(notification) =
                notify(NotificationTarget::Parking, key, today, inputs)
            {
                outcome.notifications.push(notification);
            }
        }
    }

    if hour == settings.favorites_check_hour {
        for favorite in inputs.favorites.iter() {
            let Some(zone) = inputs.zones.find_by_name(&favorite.name, today) else {
                debug!(name = %favorite.name, "Favorite street not in the schedule");
                continue;
            };
            let target = NotificationTarget::Favorite(favorite.name.clone());
            if let Some(notification) = notify(target, &zone.key(), today, inputs) {
                outcome.notifications.push(notification);
            }
        }
    }

    outcome
}

fn notify(
    target: NotificationTarget,
    key: &ZoneKey,
    today: NaiveDate,
    inputs: &ReminderInputs,
) -> Option<Notification> {
    let zone = inputs.zones.get(key);
    // A zone dropped by a refresh still has its weekly days
    let date = match zone {
        Some(zone) => zone.next_cleaning(today),
        None => Recurrence::default().next_date(key.days, today),
    }?;

    let days_until = (date - today).num_days();
    let severity = Severity::for_days_until(days_until, inputs.settings.warning_days_advance)?;

    let notification = Notification {
        target,
        zone: key.clone(),
        severity,
        date,
        days_until,
        time_window: zone.and_then(|zone| zone.time_window),
    };

    if inputs.scheduler.already_sent(&notification) {
        debug!(key = %notification.target.marker_key(), %date, "Reminder already sent");
        return None;
    }
    Some(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ParkedVehicle;
    use geo::{line_string, Point};
    use parkwatch_schedule::prelude::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn zones() -> ZoneIndex {
        let wed = CleaningZone::new(
            StreetName::from("VIA ROMA"),
            None,
            DaySet::single(DayCode::Wed),
            line_string![(x: 11.2540, y: 43.7700), (x: 11.2552, y: 43.7700)],
        )
        .unwrap();
        let fri = CleaningZone::new(
            StreetName::from("VIA MAGGIO"),
            SectionName::optional("DA PONTE SANTA TRINITA A PIAZZA SAN FELICE"),
            DaySet::single(DayCode::Fri),
            line_string![(x: 11.2490, y: 43.7660), (x: 11.2480, y: 43.7650)],
        )
        .unwrap();
        let neri = CleaningZone::new(
            StreetName::from("VIA DEI NERI"),
            None,
            DaySet::single(DayCode::Wed),
            line_string![(x: 11.2560, y: 43.7680), (x: 11.2572, y: 43.7680)],
        )
        .unwrap();
        ZoneIndex::from_zones(vec![wed, fri, neri])
    }

    fn parked_on_via_roma(index: &ZoneIndex, parked_at: NaiveDateTime) -> ParkingState {
        let found = index.match_point(Point::new(11.2546, 43.77013), 20.0);
        assert!(found.is_some());
        let mut parking = ParkingState::default();
        parking.park(ParkedVehicle::new(
            GeoPosition::new(43.77013, 11.2546),
            found.as_ref(),
            parked_at,
        ));
        parking
    }

    fn fresh_scheduler(now: NaiveDateTime) -> SchedulerState {
        let mut scheduler = SchedulerState::default();
        scheduler.refresh.record_success(now, 2);
        scheduler
    }

    struct Fixture {
        parking: ParkingState,
        favorites: Favorites,
        settings: Settings,
        zones: ZoneIndex,
        scheduler: SchedulerState,
    }

    impl Fixture {
        fn inputs(&self) -> ReminderInputs<'_> {
            ReminderInputs {
                parking: &self.parking,
                favorites: &self.favorites,
                settings: &self.settings,
                zones: &self.zones,
                scheduler: &self.scheduler,
            }
        }
    }

    fn fixture(parked_at: NaiveDateTime) -> Fixture {
        let zones = zones();
        Fixture {
            parking: parked_on_via_roma(&zones, parked_at),
            favorites: Favorites::default(),
            settings: Settings::default(),
            zones,
            scheduler: fresh_scheduler(parked_at),
        }
    }

    #[test]
    fn test_parked_today_is_urgent() {
        // 2024-05-15 is a Wednesday
        let f = fixture(at(15, 6));
        let outcome = evaluate(at(15, 8), &f.inputs());

        assert_eq!(outcome.notifications.len(), 1);
        let notification = &outcome.notifications[0];
        assert_eq!(notification.target, NotificationTarget::Parking);
        assert_eq!(notification.severity, Severity::Urgent);
        assert_eq!(notification.date, NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
        assert_eq!(notification.days_until, 0);
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn test_severity_follows_days_until() {
        let f = fixture(at(13, 6));
        let monday = evaluate(at(13, 8), &f.inputs());
        assert_eq!(monday.notifications[0].severity, Severity::Info);

        let tuesday = evaluate(at(14, 20), &f.inputs());
        assert_eq!(tuesday.notifications[0].severity, Severity::Warning);

        // Thursday after parking: next Wednesday is beyond the advance window
        let f = fixture(at(16, 6));
        assert!(evaluate(at(16, 8), &f.inputs()).notifications.is_empty());
    }

    #[test]
    fn test_parking_reminders_only_at_reminder_hours() {
        let f = fixture(at(15, 6));
        assert!(evaluate(at(15, 9), &f.inputs()).notifications.is_empty());
        assert!(evaluate(at(15, 7), &f.inputs()).notifications.is_empty());
        assert_eq!(evaluate(at(15, 20), &f.inputs()).notifications.len(), 1);
    }

    #[test]
    fn test_no_repeat_across_consecutive_ticks() {
        let mut f = fixture(at(15, 6));

        let first = evaluate(at(15, 8), &f.inputs());
        assert_eq!(first.notifications.len(), 1);
        first.apply_markers(&mut f.scheduler, at(15, 8).date());

        let second = evaluate(at(15, 8), &f.inputs());
        assert!(second.notifications.is_empty());
        let evening = evaluate(at(15, 20), &f.inputs());
        assert!(evening.notifications.is_empty());
    }

    #[test]
    fn test_severity_change_is_sent_again() {
        let mut f = fixture(at(14, 6));

        let tuesday = evaluate(at(14, 8), &f.inputs());
        assert_eq!(tuesday.notifications[0].severity, Severity::Warning);
        tuesday.apply_markers(&mut f.scheduler, at(14, 8).date());

        let wednesday = evaluate(at(15, 8), &f.inputs());
        assert_eq!(wednesday.notifications.len(), 1);
        assert_eq!(wednesday.notifications[0].severity, Severity::Urgent);
    }

    #[test]
    fn test_reparking_on_another_zone_same_day_is_notified() {
        let mut f = fixture(at(15, 6));

        let morning = evaluate(at(15, 8), &f.inputs());
        assert_eq!(morning.notifications.len(), 1);
        morning.apply_markers(&mut f.scheduler, at(15, 8).date());

        let found = f.zones.match_point(Point::new(11.2566, 43.76801), 20.0);
        assert_eq!(found.as_ref().unwrap().zone.street.as_str(), "VIA DEI NERI");
        f.parking.park(ParkedVehicle::new(
            GeoPosition::new(43.76801, 11.2566),
            found.as_ref(),
            at(15, 12),
        ));

        let evening = evaluate(at(15, 20), &f.inputs());
        assert_eq!(evening.notifications.len(), 1);
        let notification = &evening.notifications[0];
        assert_eq!(notification.zone.street.as_str(), "VIA DEI NERI");
        assert_eq!(notification.severity, Severity::Urgent);

        evening.apply_markers(&mut f.scheduler, at(15, 20).date());
        assert!(evaluate(at(15, 20), &f.inputs()).notifications.is_empty());
    }

    #[test]
    fn test_expired_parking_asks_for_clear() {
        let f = fixture(at(15, 6));
        let outcome = evaluate(at(16, 8), &f.inputs());

        assert!(outcome.wants(MaintenanceAction::ExpireParking));
        assert!(outcome.notifications.is_empty());
    }

    #[test]
    fn test_unmatched_parking_is_silent() {
        let mut f = fixture(at(15, 6));
        f.parking.park(ParkedVehicle::new(GeoPosition::new(43.78, 11.27), None, at(15, 7)));
        assert!(evaluate(at(15, 8), &f.inputs()).is_empty());
    }

    #[test]
    fn test_favorites_checked_once_a_day() {
        let mut f = fixture(at(15, 6));
        f.parking = ParkingState::default();
        f.favorites.add("via maggio", None, at(1, 9));
        f.favorites.add("Via Inesistente", None, at(1, 9));

        // Thursday 2024-05-16, cleaning Friday
        assert!(evaluate(at(16, 8), &f.inputs()).notifications.is_empty());

        let noon = evaluate(at(16, 12), &f.inputs());
        assert_eq!(noon.notifications.len(), 1);
        let notification = &noon.notifications[0];
        assert_eq!(notification.target, NotificationTarget::Favorite("via maggio".into()));
        assert_eq!(notification.zone.street.as_str(), "VIA MAGGIO");
        assert_eq!(notification.severity, Severity::Warning);
    }

    #[test]
    fn test_refresh_due_without_blocking_reminders() {
        let mut f = fixture(at(15, 6));
        f.scheduler.refresh = Default::default();
        f.scheduler.refresh.record_failure(at(15, 7));

        let outcome = evaluate(at(15, 8), &f.inputs());
        assert!(outcome.wants(MaintenanceAction::RefreshSchedule));
        assert_eq!(outcome.notifications.len(), 1);
    }

    #[test]
    fn test_disabled_notifications_keep_maintenance() {
        let mut f = fixture(at(15, 6));
        f.settings.notifications_enabled = false;
        f.scheduler.refresh = Default::default();

        let outcome = evaluate(at(16, 8), &f.inputs());
        assert!(outcome.notifications.is_empty());
        assert!(outcome.wants(MaintenanceAction::RefreshSchedule));
        assert!(outcome.wants(MaintenanceAction::ExpireParking));
    }

    #[test]
    fn test_zone_missing_after_refresh_uses_stored_days() {
        let mut f = fixture(at(15, 6));
        f.zones = ZoneIndex::new();

        let outcome = evaluate(at(15, 8), &f.inputs());
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].severity, Severity::Urgent);
        assert!(outcome.notifications[0].time_window.is_none());
    }
}
