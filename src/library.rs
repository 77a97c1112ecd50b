//! Track catalog: the media index, full scans, and the cached snapshot.
//!
//! A `MediaIndex` answers music queries and point lookups. `CatalogScanner`
//! turns a full query into a sorted `Catalog`; `CatalogCache` keeps the last
//! snapshot between runs and `reconcile` drops entries the index no longer
//! has. `acquire` runs one of those two paths on a worker thread.

mod acquire;
mod cache;
mod display;
mod index;
mod model;
mod scan;

pub use acquire::{Acquired, Acquisition, acquire};
pub use cache::{CatalogCache, index_liveness, reconcile};
pub use display::{TagView, format_duration_ms};
pub use index::{DirectoryIndex, IndexError, MediaIndex};
pub use model::{Catalog, Track, TrackId};
pub use scan::CatalogScanner;

#[cfg(test)]
mod tests;
