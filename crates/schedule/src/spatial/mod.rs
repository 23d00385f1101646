//! Distance engine, street matcher and spatial indexing.

pub mod index;
pub mod matching;
pub mod queries;

pub use matching::{match_zone, nearby_zones, ZoneMatch};
pub use queries::{point_distance, point_to_polyline_distance, point_to_segment_distance};
