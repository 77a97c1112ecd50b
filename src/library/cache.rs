use crate::store::{AppPrefs, Record, StateStore, StoreError};

use super::index::MediaIndex;
use super::model::{Catalog, Track};

/// The last catalog snapshot and the "have we scanned" flag.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    record: Record<AppPrefs>,
}

impl CatalogCache {
    pub fn new(store: &StateStore) -> Self {
        Self {
            record: store.app().clone(),
        }
    }

    pub fn has_scanned(&self) -> Result<bool, StoreError> {
        Ok(self.record.load()?.has_scanned)
    }

    /// The persisted snapshot, if one was ever saved.
    pub fn load(&self) -> Result<Option<Catalog>, StoreError> {
        Ok(self.record.load()?.cached_catalog)
    }

    /// Replace the persisted snapshot.
    pub fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.record
            .update(|prefs| prefs.cached_catalog = Some(catalog.clone()))
    }

    /// Replace the snapshot and raise the scan flag in the same write.
    pub fn save_scanned(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.record.update(|prefs| {
            prefs.cached_catalog = Some(catalog.clone());
            prefs.has_scanned = true;
        })
    }

    /// Forget that a scan happened; the next acquisition runs a full scan.
    pub fn clear_scanned(&self) -> Result<(), StoreError> {
        self.record.update(|prefs| prefs.has_scanned = false)
    }
}

/// Drop every track for which `exists` is false.
///
/// Returns the filtered catalog and whether anything was removed. When it
/// was, the caller must persist the result so stale entries are not shown
/// again on the next cold read.
pub fn reconcile(catalog: Catalog, mut exists: impl FnMut(&Track) -> bool) -> (Catalog, bool) {
    let before = catalog.len();
    let filtered = catalog.retain_into(|t| exists(t));
    let changed = filtered.len() != before;
    (filtered, changed)
}

/// Liveness predicate backed by the index's point query.
///
/// An index that cannot answer counts as empty: a track is only shown while
/// the index can vouch for it.
pub fn index_liveness(index: &dyn MediaIndex) -> impl FnMut(&Track) -> bool + '_ {
    move |track: &Track| match index.contains(track.id) {
        Ok(present) => present,
        Err(e) => {
            tracing::warn!(id = %track.id, error = %e, "liveness check failed, dropping track");
            false
        }
    }
}
