//! Cleaning schedule data models and types.

pub mod calendar;
pub mod types;
pub mod zone;

// Re-exports for convenience
pub use calendar::{next_occurrence, DayParity, DaySet, MonthWeeks, Recurrence};
pub use types::{DayCode, GeoPosition, Result, ScheduleError};
pub use zone::{CleaningZone, TimeWindow};
