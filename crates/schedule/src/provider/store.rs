//! Schedule store: owns the current zone snapshot and replaces it on refresh.
//!
//! Readers take an `Arc<ZoneIndex>` and keep a complete, consistent view for
//! as long as they hold it. A refresh parses and filters off to the side and
//! swaps the new snapshot in only when everything succeeded; any failure
//! leaves the previous snapshot serving.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{info, warn};

use crate::ingest::parse_document;
use crate::models::types::Result;
use crate::models::zone::CleaningZone;
use crate::network::storage::{read_if_exists, write_atomic};
use crate::network::traits::ScheduleFetcher;
use crate::overrides::OverrideSet;
use crate::provider::zone_index::ZoneIndex;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub source_url: String,
    /// Where the last good raw payload is kept between runs
    pub cache_path: Option<PathBuf>,
    /// A cache younger than this is used at startup instead of fetching
    pub cache_max_age: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleSource {
    Remote,
    Cache,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    /// Zones queryable after override filtering
    pub loaded: usize,
    /// Records skipped as malformed
    pub skipped: usize,
    /// Entries removed by override rules
    pub excluded: usize,
    pub source: ScheduleSource,
}

struct Loaded {
    raw: Arc<Vec<CleaningZone>>,
    index: Arc<ZoneIndex>,
}

pub struct ScheduleStore {
    config: StoreConfig,
    fetcher: Arc<dyn ScheduleFetcher>,
    overrides: RwLock<Arc<OverrideSet>>,
    loaded: RwLock<Loaded>,
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ScheduleStore {
    pub fn new(
        config: StoreConfig,
        fetcher: Arc<dyn ScheduleFetcher>,
        overrides: OverrideSet,
    ) -> Self {
        Self {
            config,
            fetcher,
            overrides: RwLock::new(Arc::new(overrides)),
            loaded: RwLock::new(Loaded {
                raw: Arc::new(Vec::new()),
                index: Arc::new(ZoneIndex::new()),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current queryable snapshot
    pub fn snapshot(&self) -> Arc<ZoneIndex> {
        read_lock(&self.loaded).index.clone()
    }

    pub fn overrides(&self) -> Arc<OverrideSet> {
        read_lock(&self.overrides).clone()
    }

    /// Replace the override rules and re-filter the last loaded schedule.
    ///
    /// Returns the number of queryable zones afterwards.
    pub fn set_overrides(&self, overrides: OverrideSet) -> usize {
        let mut loaded = write_lock(&self.loaded);
        let overrides = Arc::new(overrides);
        *write_lock(&self.overrides) = overrides.clone();

        let outcome = overrides.apply(loaded.raw.as_ref().clone());
        loaded.index = Arc::new(ZoneIndex::from_zones(outcome.zones));
        info!(zones = loaded.index.len(), "Override rules reloaded");
        loaded.index.len()
    }

    /// Parse `payload`, filter it and swap it in.
    ///
    /// On error the current snapshot is left untouched.
    pub fn load_payload(&self, payload: &[u8], source: ScheduleSource) -> Result<RefreshReport> {
        let parsed = parse_document(payload)?;
        let raw = Arc::new(parsed.zones);

        let mut loaded = write_lock(&self.loaded);
        let outcome = self.overrides().apply(raw.as_ref().clone());
        let report = RefreshReport {
            loaded: outcome.zones.len(),
            skipped: parsed.skipped,
            excluded: outcome.excluded,
            source,
        };

        *loaded = Loaded {
            raw,
            index: Arc::new(ZoneIndex::from_zones(outcome.zones)),
        };

        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            excluded = report.excluded,
            ?source,
            "Cleaning schedule swapped in"
        );
        Ok(report)
    }

    /// Fetch from the remote source and replace the snapshot.
    ///
    /// Fetch and parse failures keep the previous snapshot.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let result = self.fetch_and_load().await;
        if let Err(e) = &result {
            warn!(error = %e, "Schedule refresh failed, keeping previous data");
        }
        result
    }

    /// Startup load: a fresh cache wins, otherwise fetch, falling back to a
    /// stale cache when the source is unreachable.
    pub async fn bootstrap(&self) -> Result<RefreshReport> {
        if self.cache_is_fresh() {
            match self.load_cached() {
                Ok(Some(report)) => return Ok(report),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cached schedule unusable"),
            }
        }

        match self.refresh().await {
            Ok(report) => Ok(report),
            Err(fetch_error) => match self.load_cached() {
                Ok(Some(report)) => {
                    warn!("Serving stale cached schedule until the next refresh");
                    Ok(report)
                }
                _ => Err(fetch_error),
            },
        }
    }

    /// Load the cached payload, if there is one
    pub fn load_cached(&self) -> Result<Option<RefreshReport>> {
        let Some(path) = &self.config.cache_path else {
            return Ok(None);
        };

        match read_if_exists(path)? {
            Some(payload) => self.load_payload(&payload, ScheduleSource::Cache).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_and_load(&self) -> Result<RefreshReport> {
        let payload = self.fetcher.fetch(&self.config.source_url).await?;
        let report = self.load_payload(&payload, ScheduleSource::Remote)?;

        if let Some(path) = &self.config.cache_path {
            if let Err(e) = write_atomic(path, &payload) {
                warn!(path = %path.display(), error = %e, "Could not update schedule cache");
            }
        }
        Ok(report)
    }

    fn cache_is_fresh(&self) -> bool {
        let Some(path) = &self.config.cache_path else {
            return false;
        };

        std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age < self.config.cache_max_age)
    }
}
