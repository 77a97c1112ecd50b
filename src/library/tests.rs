use super::*;
use crate::config::TrackDisplayField;
use crate::store::StateStore;
use crate::testing::{FakeIndex, t};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn tags<'a>(path: &'a Path, artist: Option<&'a str>) -> TagView<'a> {
    TagView {
        path,
        title: "Song",
        artist,
        album: None,
    }
}

#[test]
fn display_name_joins_the_fields_that_have_values() {
    let p = Path::new("/tmp/take-two.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];

    assert_eq!(tags(p, Some("Artist")).display_name(&fields, " - "), "Artist - Song");
    assert_eq!(tags(p, Some("  Artist  ")).display_name(&fields, " - "), "Artist - Song");
    assert_eq!(tags(p, None).display_name(&fields, " - "), "Song");
    assert_eq!(tags(p, Some("   ")).display_name(&fields, " - "), "Song");
    assert_eq!(
        tags(p, None).display_name(&[TrackDisplayField::Filename], " - "),
        "take-two"
    );
}

#[test]
fn display_name_falls_back_to_title_when_nothing_matches() {
    let p = Path::new("/tmp/x.mp3");
    assert_eq!(tags(p, None).display_name(&[TrackDisplayField::Album], " / "), "Song");
    assert_eq!(tags(p, None).display_name(&[], " / "), "Song");
}

#[test]
fn duration_formatting_has_no_hour_rollover() {
    assert_eq!(format_duration_ms(0), "00:00");
    assert_eq!(format_duration_ms(59_999), "00:59");
    assert_eq!(format_duration_ms(60_000), "01:00");
    assert_eq!(format_duration_ms(3_600_000), "60:00");
    assert_eq!(format_duration_ms(6_000_000), "100:00");
}

#[test]
fn scan_sorts_by_display_name_case_sensitive_and_stable() {
    let index = Arc::new(FakeIndex::with(vec![
        t(1, "beta", 0),
        t(2, "Alpha", 0),
        t(3, "alpha", 0),
        t(4, "Alpha", 0),
    ]));
    let catalog = CatalogScanner::new(index).scan();

    let ids: Vec<u64> = catalog.iter().map(|t| t.id.0).collect();
    // Uppercase sorts before lowercase; the two "Alpha" keep index order.
    assert_eq!(ids, vec![2, 4, 3, 1]);
}

#[test]
fn scan_of_unavailable_index_is_empty_not_an_error() {
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0)]));
    index.set_unavailable(true);
    assert!(CatalogScanner::new(index).scan().is_empty());
}

#[test]
fn reconcile_drops_missing_and_reports_change() {
    let catalog = Catalog::from_unsorted(vec![t(1, "a", 0), t(2, "b", 0), t(3, "c", 0)]);
    let (filtered, changed) = reconcile(catalog, |t| t.id != TrackId(2));
    assert!(changed);
    let ids: Vec<u64> = filtered.iter().map(|t| t.id.0).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn reconcile_is_idempotent() {
    let index = FakeIndex::with(vec![t(1, "a", 0), t(3, "c", 0)]);
    let catalog = Catalog::from_unsorted(vec![t(1, "a", 0), t(2, "b", 0), t(3, "c", 0)]);

    let (once, changed_once) = reconcile(catalog, index_liveness(&index));
    let (twice, changed_twice) = reconcile(once.clone(), index_liveness(&index));

    assert!(changed_once);
    assert!(!changed_twice);
    assert_eq!(once, twice);
}

#[test]
fn liveness_drops_tracks_when_lookups_fail() {
    let index = FakeIndex::with(vec![t(1, "a", 0)]);
    index.set_broken_lookups(true);
    let catalog = Catalog::from_unsorted(vec![t(1, "a", 0)]);
    let (kept, changed) = reconcile(catalog, index_liveness(&index));
    assert!(changed);
    assert!(kept.is_empty());
}

#[test]
fn cached_read_against_broken_index_shows_nothing() {
    let dir = tempdir().unwrap();
    let cache = CatalogCache::new(&StateStore::open(dir.path()));
    cache
        .save_scanned(&Catalog::from_unsorted(vec![t(1, "a", 0), t(2, "b", 0)]))
        .unwrap();
    let fake = Arc::new(FakeIndex::with(vec![t(1, "a", 0), t(2, "b", 0)]));
    fake.set_broken_lookups(true);
    let index: Arc<dyn MediaIndex> = fake;

    let out = acquire(Acquisition::CachedRead, &index, &cache).unwrap();
    assert_eq!(out.ran, Acquisition::CachedRead);
    assert!(out.catalog.is_empty());
    assert!(out.persisted);
    assert_eq!(cache.load().unwrap(), Some(Catalog::default()));
}

#[test]
fn cache_round_trips_snapshot_and_scan_flag() {
    let dir = tempdir().unwrap();
    let cache = CatalogCache::new(&StateStore::open(dir.path()));

    assert!(!cache.has_scanned().unwrap());
    assert_eq!(cache.load().unwrap(), None);

    let catalog = Catalog::from_unsorted(vec![t(1, "a", 1_000)]);
    cache.save_scanned(&catalog).unwrap();
    assert!(cache.has_scanned().unwrap());
    assert_eq!(cache.load().unwrap(), Some(catalog));

    cache.clear_scanned().unwrap();
    assert!(!cache.has_scanned().unwrap());
    assert!(cache.load().unwrap().is_some());
}

#[test]
fn full_scan_persists_snapshot_and_flag() {
    let dir = tempdir().unwrap();
    let cache = CatalogCache::new(&StateStore::open(dir.path()));
    let index: Arc<dyn MediaIndex> = Arc::new(FakeIndex::with(vec![t(2, "b", 0), t(1, "a", 0)]));

    let out = acquire(Acquisition::FullScan, &index, &cache).unwrap();
    assert_eq!(out.ran, Acquisition::FullScan);
    assert!(out.persisted);
    assert_eq!(out.catalog.get(0).unwrap().display_name, "a");
    assert!(cache.has_scanned().unwrap());
    assert_eq!(cache.load().unwrap(), Some(out.catalog));
}

#[test]
fn cached_read_filters_stale_entries_and_persists_only_on_change() {
    let dir = tempdir().unwrap();
    let cache = CatalogCache::new(&StateStore::open(dir.path()));
    let fake = Arc::new(FakeIndex::with(vec![t(1, "a", 0), t(2, "b", 0)]));
    let index: Arc<dyn MediaIndex> = fake.clone();

    acquire(Acquisition::FullScan, &index, &cache).unwrap();
    fake.remove(TrackId(2));

    let first = acquire(Acquisition::CachedRead, &index, &cache).unwrap();
    assert_eq!(first.ran, Acquisition::CachedRead);
    assert!(first.persisted);
    assert_eq!(first.catalog.len(), 1);
    assert_eq!(cache.load().unwrap().unwrap().len(), 1);

    let second = acquire(Acquisition::CachedRead, &index, &cache).unwrap();
    assert!(!second.persisted);
    assert_eq!(second.catalog, first.catalog);

    // Cached reads never run a full query.
    assert_eq!(fake.music_calls(), 1);
}

#[test]
fn cached_read_without_snapshot_falls_back_to_scan() {
    let dir = tempdir().unwrap();
    let cache = CatalogCache::new(&StateStore::open(dir.path()));
    let index: Arc<dyn MediaIndex> = Arc::new(FakeIndex::with(vec![t(1, "a", 0)]));

    let out = acquire(Acquisition::CachedRead, &index, &cache).unwrap();
    assert_eq!(out.ran, Acquisition::FullScan);
    assert_eq!(out.catalog.len(), 1);
}
