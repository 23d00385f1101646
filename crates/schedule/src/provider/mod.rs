//! Schedule providers.

pub mod store;
pub mod zone_index;

pub use store::{RefreshReport, ScheduleSource, ScheduleStore, StoreConfig};
pub use zone_index::ZoneIndex;
