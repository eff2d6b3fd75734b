use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use dts_import::FileFingerprint;

use crate::enrich::EnrichedTable;

type CacheKey = (PathBuf, PathBuf);

struct Entry {
    transactions: FileFingerprint,
    mapping: FileFingerprint,
    table: Arc<EnrichedTable>,
}

type Slot = Arc<Mutex<Option<Entry>>>;

/// Enriched tables keyed by their two source files.
///
/// An entry is reused only while both files hash the same as when it was
/// built. Each key has its own lock, so a slow load never blocks other keys.
#[derive(Default)]
pub struct EnrichedCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

// Slots only ever hold complete entries, so a poisoned lock is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EnrichedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by every [`crate::Pipeline`] built with `Pipeline::new`.
    pub fn global() -> Arc<EnrichedCache> {
        static GLOBAL: OnceLock<Arc<EnrichedCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(EnrichedCache::new())).clone()
    }

    /// Returns the cached table for these files, running `load` on a miss or
    /// when either file's contents changed.
    pub fn get_or_load<E, F>(
        &self,
        transactions: &Path,
        mapping: &Path,
        load: F,
    ) -> Result<Arc<EnrichedTable>, E>
    where
        F: FnOnce() -> Result<EnrichedTable, E>,
        E: From<io::Error>,
    {
        let tx_print = FileFingerprint::of(transactions)?;
        let map_print = FileFingerprint::of(mapping)?;
        let key = (tx_print.path.clone(), map_print.path.clone());

        let slot = lock(&self.slots).entry(key).or_default().clone();
        let mut entry = lock(&slot);

        if let Some(e) = entry.as_ref() {
            if e.transactions == tx_print && e.mapping == map_print {
                tracing::debug!("Enriched cache hit ({}, {})", tx_print.hex(), map_print.hex());
                return Ok(e.table.clone());
            }
            tracing::info!("Source files changed; rebuilding enriched table");
        }

        let table = Arc::new(load()?);
        *entry = Some(Entry {
            transactions: tx_print,
            mapping: map_print,
            table: table.clone(),
        });
        Ok(table)
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}
