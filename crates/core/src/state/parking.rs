use std::collections::VecDeque;

use chrono::{NaiveDate, NaiveDateTime};
use parkwatch_schedule::identifiers::ZoneKey;
use parkwatch_schedule::models::GeoPosition;
use parkwatch_schedule::spatial::ZoneMatch;
use serde::{Deserialize, Serialize};

/// Past parking events kept, oldest evicted first
pub const HISTORY_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkedVehicle {
    pub location: GeoPosition,
    /// Zone matched at report time, referenced by value
    pub matched_zone: Option<ZoneKey>,
    pub distance_m: Option<f64>,
    pub parked_at: NaiveDateTime,
    /// First cleaning on or after `parked_at`
    pub next_cleaning: Option<NaiveDate>,
}

impl ParkedVehicle {
    pub fn new(location: GeoPosition, matched: Option<&ZoneMatch>, parked_at: NaiveDateTime) -> Self {
        Self {
            location,
            matched_zone: matched.map(|found| found.zone.key()),
            distance_m: matched.map(|found| found.distance_m),
            parked_at,
            next_cleaning: matched.and_then(|found| found.zone.next_cleaning(parked_at.date())),
        }
    }

    pub fn is_in_zone(&self) -> bool {
        self.matched_zone.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingState {
    pub current: Option<ParkedVehicle>,
    /// Oldest first
    pub history: VecDeque<ParkedVehicle>,
}

impl ParkingState {
    /// Record a new parking position; the previous one moves to history.
    pub fn park(&mut self, vehicle: ParkedVehicle) {
        if let Some(previous) = self.current.replace(vehicle) {
            self.archive(previous);
        }
    }

    /// Returns `false` when nothing was parked.
    pub fn clear(&mut self) -> bool {
        match self.current.take() {
            Some(previous) => {
                self.archive(previous);
                true
            }
            None => false,
        }
    }

    fn archive(&mut self, vehicle: ParkedVehicle) {
        self.history.push_back(vehicle);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::snapshot::tests::scratch_dir;
    use crate::state::snapshot::{load_json, save_json};
    use chrono::NaiveTime;
    use geo::{line_string, Point};
    use parkwatch_schedule::prelude::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    fn via_roma() -> ZoneIndex {
        let zone = CleaningZone::new(
            StreetName::from("VIA ROMA"),
            SectionName::optional("DA PIAZZA DUOMO A VIA DEI PECORI"),
            DaySet::single(DayCode::Wed),
            line_string![(x: 11.2540, y: 43.7700), (x: 11.2552, y: 43.7700)],
        )
        .unwrap();
        ZoneIndex::from_zones(vec![zone])
    }

    fn vehicle(n: u32) -> ParkedVehicle {
        ParkedVehicle::new(
            GeoPosition::new(43.76 + f64::from(n) * 0.001, 11.25),
            None,
            at(1 + n % 28, 9),
        )
    }

    #[test]
    fn test_matched_vehicle_records_zone_and_date() {
        let index = via_roma();
        let found = index.match_point(Point::new(11.2546, 43.77013), 20.0);
        let parked = ParkedVehicle::new(GeoPosition::new(43.77013, 11.2546), found.as_ref(), at(13, 18));

        let key = parked.matched_zone.as_ref().unwrap();
        assert_eq!(key.street.as_str(), "VIA ROMA");
        assert!(parked.distance_m.unwrap() < 20.0);
        assert_eq!(parked.next_cleaning, NaiveDate::from_ymd_opt(2024, 5, 15));
    }

    #[test]
    fn test_park_and_clear_push_history() {
        let mut state = ParkingState::default();
        assert!(!state.clear());

        state.park(vehicle(1));
        state.park(vehicle(2));
        assert_eq!(state.history, vec![vehicle(1)]);

        assert!(state.clear());
        assert!(state.current.is_none());
        assert_eq!(state.history, vec![vehicle(1), vehicle(2)]);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut state = ParkingState::default();
        for n in 0..15 {
            state.park(vehicle(n));
        }

        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(state.history.front(), Some(&vehicle(4)));
        assert_eq!(state.history.back(), Some(&vehicle(13)));
        assert_eq!(state.current, Some(vehicle(14)));
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let index = via_roma();
        let found = index.match_point(Point::new(11.2546, 43.77013), 20.0);

        let mut state = ParkingState::default();
        for n in 0..3 {
            state.park(vehicle(n));
        }
        state.park(ParkedVehicle::new(
            GeoPosition::new(43.77013, 11.2546),
            found.as_ref(),
            at(13, 18),
        ));

        let path = scratch_dir("parking-round-trip").join("parking.json");
        save_json(&path, &state).unwrap();
        let loaded: ParkingState = load_json(&path).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.history.len(), 3);
    }
}
