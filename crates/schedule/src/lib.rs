//! # parkwatch-schedule
//!
//! Street-cleaning schedule data for Florence: ingestion, correction and
//! spatial matching.
//!
//! ## Features
//!
//! - **KML / KMZ ingestion**: Placemark records from the municipal open data
//! - **Override rules**: Drop known-bad day occurrences before they are served
//! - **Spatial queries**: Haversine point-to-polyline distance with an R-tree prefilter
//! - **Calendar**: Next cleaning date from day codes and week-of-month rules
//! - **Atomic refresh**: Readers always see one complete snapshot
//!
//! ## Example
//!
//! ```
//! use parkwatch_schedule::prelude::*;
//! use chrono::NaiveDate;
//! use geo::{line_string, Point};
//!
//! let zone = CleaningZone::new(
//!     StreetName::from("VIA ROMA"),
//!     None,
//!     DaySet::single(DayCode::Wed),
//!     line_string![(x: 11.2540, y: 43.7700), (x: 11.2552, y: 43.7700)],
//! )?;
//! let index = ZoneIndex::from_zones(vec![zone]);
//!
//! // About 14 m north of the street axis
//! let parked = Point::new(11.2546, 43.77013);
//! let found = index.match_point(parked, 20.0).expect("within 20 m");
//! assert_eq!(found.zone.street.as_str(), "VIA ROMA");
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
//! assert_eq!(
//!     found.zone.next_cleaning(monday),
//!     NaiveDate::from_ymd_opt(2024, 5, 15)
//! );
//! # Ok::<(), ScheduleError>(())
//! ```

pub mod identifiers;
pub mod ingest;
pub mod models;
pub mod network;
pub mod overrides;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::ingest::{parse_document, ParsedSchedule};
    pub use crate::models::*;
    pub use crate::network::{HttpFetcher, ScheduleFetcher};
    pub use crate::overrides::{FilterOutcome, OverrideRule, OverrideSet};
    pub use crate::provider::{RefreshReport, ScheduleSource, ScheduleStore, StoreConfig, ZoneIndex};
    pub use crate::spatial::{match_zone, nearby_zones, ZoneMatch};
}

pub use prelude::*;
