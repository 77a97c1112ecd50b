use std::sync::Arc;

use super::index::MediaIndex;
use super::model::Catalog;

/// Full catalog query against the media index.
///
/// This hits the index for every music entry, so it belongs on a worker
/// thread, never on the UI loop.
#[derive(Clone)]
pub struct CatalogScanner {
    index: Arc<dyn MediaIndex>,
}

impl CatalogScanner {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    /// All music entries sorted by display name. An empty or unavailable
    /// index yields an empty catalog.
    pub fn scan(&self) -> Catalog {
        match self.index.music() {
            Ok(tracks) => {
                let catalog = Catalog::from_unsorted(tracks);
                tracing::info!(count = catalog.len(), "catalog scan finished");
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "media index unavailable, showing an empty catalog");
                Catalog::default()
            }
        }
    }
}
