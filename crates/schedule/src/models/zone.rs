//! Cleaning zone entries: one street/section/day combination.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use geo::LineString;

use crate::identifiers::{SectionName, StreetName, ZoneKey};
use crate::models::calendar::{DaySet, Recurrence};
use crate::models::types::{Result, ScheduleError};

/// Local time-of-day span of the sweeping operation (display only)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A normalized municipal cleaning record.
///
/// Geometry follows geo's axis order (x = longitude, y = latitude). Entries
/// are immutable once loaded; a refresh replaces the whole collection.
#[derive(Clone, Debug, PartialEq)]
pub struct CleaningZone {
    pub street: StreetName,
    pub section: Option<SectionName>,
    pub days: DaySet,
    pub time_window: Option<TimeWindow>,
    pub recurrence: Recurrence,
    pub geometry: LineString<f64>,
    pub placemark_name: Arc<str>,
}

impl CleaningZone {
    /// Build a weekly zone, checking the record invariants.
    pub fn new(
        street: StreetName,
        section: Option<SectionName>,
        days: DaySet,
        geometry: LineString<f64>,
    ) -> Result<Self> {
        if street.as_str().trim().is_empty() {
            return Err(ScheduleError::Parse("empty street name".into()));
        }
        if days.is_empty() {
            return Err(ScheduleError::Parse(format!("{street}: no day code")));
        }
        if geometry.0.len() < 2 {
            return Err(ScheduleError::Parse(format!(
                "{street}: geometry has {} vertices, need at least 2",
                geometry.0.len()
            )));
        }

        Ok(Self {
            placemark_name: street.as_str().into(),
            street,
            section,
            days,
            time_window: None,
            recurrence: Recurrence::every_week(),
            geometry,
        })
    }

    pub fn with_time_window(mut self, window: Option<TimeWindow>) -> Self {
        self.time_window = window;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_placemark_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.placemark_name = name.into();
        self
    }

    pub fn key(&self) -> ZoneKey {
        ZoneKey {
            street: self.street.clone(),
            section: self.section.clone(),
            days: self.days,
        }
    }

    /// Next cleaning date on or after `from`, honoring recurrence restrictions
    pub fn next_cleaning(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.recurrence.next_date(self.days, from)
    }
}
