//! Raw schedule ingestion (KML and zipped KMZ).

pub mod kml;
pub mod kmz;

pub use kml::{parse_document, parse_kml, ParsedSchedule};
