use std::sync::Arc;

use crate::store::StoreError;

use super::cache::{CatalogCache, index_liveness, reconcile};
use super::index::MediaIndex;
use super::model::Catalog;
use super::scan::CatalogScanner;

/// How the catalog shown to the user is obtained.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Query the whole index and persist the result.
    FullScan,
    /// Read the persisted snapshot and drop entries the index lost.
    CachedRead,
}

/// Result of one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub catalog: Catalog,
    /// What actually ran (a cached read without a snapshot becomes a scan).
    pub ran: Acquisition,
    /// Whether the snapshot on disk was rewritten.
    pub persisted: bool,
}

/// Run `kind` to completion. Blocking: call from a worker thread.
pub fn acquire(
    kind: Acquisition,
    index: &Arc<dyn MediaIndex>,
    cache: &CatalogCache,
) -> Result<Acquired, StoreError> {
    if kind == Acquisition::CachedRead {
        if let Some(cached) = cache.load()? {
            let before = cached.len();
            let (catalog, changed) = reconcile(cached, index_liveness(index.as_ref()));
            if changed {
                cache.save(&catalog)?;
                tracing::info!(
                    dropped = before - catalog.len(),
                    kept = catalog.len(),
                    "dropped stale catalog entries"
                );
            }
            return Ok(Acquired {
                catalog,
                ran: Acquisition::CachedRead,
                persisted: changed,
            });
        }
        tracing::info!("scan flag set but no snapshot on disk, rescanning");
    }

    let catalog = CatalogScanner::new(Arc::clone(index)).scan();
    cache.save_scanned(&catalog)?;
    Ok(Acquired {
        catalog,
        ran: Acquisition::FullScan,
        persisted: true,
    })
}
