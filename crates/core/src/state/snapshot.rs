//! Whole-file JSON snapshots.

use std::path::Path;

use parkwatch_schedule::network::{read_if_exists, write_atomic};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Load a snapshot, or `T::default()` when the file does not exist yet.
///
/// A file that exists but does not decode is an error; it is never
/// silently replaced by an empty value.
pub fn load_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(bytes) = read_if_exists(path).map_err(|e| CoreError::persistence(path, e))? else {
        debug!(path = %path.display(), "No snapshot yet, starting empty");
        return Ok(T::default());
    };

    serde_json::from_slice(&bytes).map_err(|e| CoreError::persistence(path, e))
}

/// Replace the snapshot at `path` atomically
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| CoreError::persistence(path, e))?;
    write_atomic(path, &bytes).map_err(|e| CoreError::persistence(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Snapshot saved");
    Ok(())
}
