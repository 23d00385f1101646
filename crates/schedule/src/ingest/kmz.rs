//! KMZ unwrapping: a ZIP archive holding one or more KML documents.

use std::io::{Cursor, Read};

use tracing::debug;

use crate::models::types::{Result, ScheduleError};

const ZIP_MAGIC: &[u8] = b"PK";

pub fn is_kmz(payload: &[u8]) -> bool {
    payload.starts_with(ZIP_MAGIC)
}

/// Text of the first `.kml` member in the archive
pub fn extract_kml(payload: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(payload))
        .map_err(|e| ScheduleError::ParseFatal(format!("invalid KMZ archive: {e}")))?;

    for i in 0..archive.len() {
        let mut member = archive
            .by_index(i)
            .map_err(|e| ScheduleError::ParseFatal(format!("unreadable KMZ member: {e}")))?;

        if !member.name().to_ascii_lowercase().ends_with(".kml") {
            continue;
        }

        debug!(member = member.name(), "Extracting KML from KMZ");
        let mut bytes = Vec::new();
        member
            .read_to_end(&mut bytes)
            .map_err(|e| ScheduleError::ParseFatal(format!("truncated KMZ member: {e}")))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    Err(ScheduleError::ParseFatal("no KML document inside KMZ archive".into()))
}
