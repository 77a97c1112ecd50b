use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

use super::controller::{Control, Controller};
use super::host::{ACCESS_FILE, Grant, TerminalHost};
use crate::app::DialogKind;
use crate::config::Settings;
use crate::library::{Catalog, CatalogCache, MediaIndex, TrackId};
use crate::permission::PermissionStatus;
use crate::playback::PlaybackSession;
use crate::store::StateStore;
use crate::testing::{FakeIndex, FakeSession, t};

fn host_in(dir: &TempDir) -> TerminalHost {
    TerminalHost::new(dir.path().join(ACCESS_FILE))
}

#[test]
fn missing_grant_file_reads_as_unset_and_denied() {
    let dir = TempDir::new().unwrap();
    let host = host_in(&dir);

    assert_eq!(host.grant(), Grant::Unset);
    assert_eq!(host.status(), PermissionStatus::Denied);
}

#[test]
fn recorded_grant_is_read_back() {
    let dir = TempDir::new().unwrap();
    let host = host_in(&dir);

    host.record(Grant::Granted).unwrap();
    assert_eq!(host.grant(), Grant::Granted);
    assert_eq!(host.status(), PermissionStatus::Granted);

    host.record(Grant::Denied).unwrap();
    assert_eq!(host.grant(), Grant::Denied);
    assert_eq!(host.status(), PermissionStatus::Denied);
}

#[test]
fn record_creates_missing_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let host = TerminalHost::new(dir.path().join("nested/config").join(ACCESS_FILE));

    host.record(Grant::Granted).unwrap();
    assert!(host.path().exists());
    assert_eq!(host.grant(), Grant::Granted);
}

#[test]
fn hand_edited_grant_is_honoured() {
    let dir = TempDir::new().unwrap();
    let host = host_in(&dir);

    fs::write(host.path(), "library = \"granted\"\n").unwrap();
    assert_eq!(host.status(), PermissionStatus::Granted);
}

#[test]
fn malformed_grant_falls_back_to_unset() {
    let dir = TempDir::new().unwrap();
    let host = host_in(&dir);

    fs::write(host.path(), "library = \"maybe\"\n").unwrap();
    assert_eq!(host.grant(), Grant::Unset);

    fs::write(host.path(), "this is not toml [").unwrap();
    assert_eq!(host.grant(), Grant::Unset);
    assert_eq!(host.status(), PermissionStatus::Denied);
}

#[test]
fn empty_grant_file_is_unset() {
    let dir = TempDir::new().unwrap();
    let host = host_in(&dir);

    fs::write(host.path(), "").unwrap();
    assert_eq!(host.grant(), Grant::Unset);
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn enter() -> KeyEvent {
    KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
}

fn cache_in(dir: &TempDir) -> CatalogCache {
    CatalogCache::new(&StateStore::open(dir.path().join("state")))
}

fn controller<'a>(
    settings: &'a Settings,
    dir: &TempDir,
    grant: Grant,
    index: &Arc<FakeIndex>,
    session: &Arc<FakeSession>,
) -> Controller<'a> {
    let host = host_in(dir);
    if grant != Grant::Unset {
        host.record(grant).unwrap();
    }
    let store = StateStore::open(dir.path().join("state"));
    let index: Arc<dyn MediaIndex> = index.clone();
    let session: Arc<dyn PlaybackSession> = session.clone();
    Controller::new(settings, &store, index, session, host)
}

/// Run frames until no acquisition is running or waiting.
fn settle(c: &mut Controller<'_>) {
    for _ in 0..400 {
        assert_eq!(c.update(Instant::now(), 80).unwrap(), Control::Continue);
        if !c.is_busy() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("acquisition did not finish");
}

fn dialog(c: &Controller<'_>) -> Option<DialogKind> {
    c.app().dialog.map(|d| d.kind)
}

#[test]
fn granted_launch_scans_and_queues_the_catalog() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(2, "b", 0), t(1, "a", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);

    assert_eq!(c.start().unwrap(), Control::Continue);
    assert!(c.app().loading);
    settle(&mut c);

    assert!(!c.app().loading);
    assert_eq!(c.app().catalog.len(), 2);
    assert_eq!(index.music_calls(), 1);
    assert_eq!(session.queue.lock().unwrap().len(), 2);
    assert!(cache_in(&dir).has_scanned().unwrap());
}

#[test]
fn refusing_prompt_then_rationale_quits() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Unset, &index, &session);

    assert_eq!(c.start().unwrap(), Control::Continue);
    assert_eq!(dialog(&c), Some(DialogKind::NativePrompt));

    assert_eq!(c.handle_key(key('n')).unwrap(), Control::Continue);
    assert_eq!(c.host().grant(), Grant::Denied);
    assert_eq!(dialog(&c), Some(DialogKind::Rationale));

    assert_eq!(c.handle_key(key('n')).unwrap(), Control::Quit);
    assert_eq!(index.music_calls(), 0);
}

#[test]
fn missing_track_offers_a_rescan_that_reruns_the_scan() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 1_000), t(2, "b", 1_000)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);
    c.start().unwrap();
    settle(&mut c);

    session.missing.lock().unwrap().push(TrackId(1));
    c.handle_key(enter()).unwrap();
    assert!(session.calls().contains(&"start"));
    assert_eq!(dialog(&c), Some(DialogKind::MissingTrack));
    assert!(c.app().player_route().is_none());

    assert_eq!(c.handle_key(key('y')).unwrap(), Control::Continue);
    assert_eq!(dialog(&c), None);
    assert!(c.app().loading);
    assert!(!cache_in(&dir).has_scanned().unwrap());

    settle(&mut c);
    assert_eq!(index.music_calls(), 2);
    assert!(cache_in(&dir).has_scanned().unwrap());
}

#[test]
fn dismissing_the_missing_track_prompt_keeps_the_catalog() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);
    c.start().unwrap();
    settle(&mut c);

    session.missing.lock().unwrap().push(TrackId(1));
    c.handle_key(enter()).unwrap();
    assert_eq!(c.handle_key(key('n')).unwrap(), Control::Continue);
    assert_eq!(dialog(&c), None);
    assert!(!c.is_busy());
    assert_eq!(index.music_calls(), 1);
}

#[test]
fn unreachable_index_at_play_time_offers_a_rescan() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);
    c.start().unwrap();
    settle(&mut c);

    session
        .index_offline
        .store(true, std::sync::atomic::Ordering::SeqCst);
    c.handle_key(enter()).unwrap();
    assert_eq!(dialog(&c), Some(DialogKind::MissingTrack));
}

#[test]
fn stepping_onto_a_missing_track_offers_a_rescan() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0), t(2, "b", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);
    c.start().unwrap();
    settle(&mut c);

    c.handle_key(enter()).unwrap();
    assert_eq!(c.app().player_route().map(|r| r.id), Some(TrackId(1)));

    session.missing.lock().unwrap().push(TrackId(2));
    c.handle_key(key('l')).unwrap();
    assert_eq!(dialog(&c), Some(DialogKind::MissingTrack));
    assert_eq!(c.app().player_route().map(|r| r.id), Some(TrackId(1)));
}

#[test]
fn rescan_during_a_cached_read_keeps_the_fresh_snapshot() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let cache = cache_in(&dir);
    cache
        .save_scanned(&Catalog::from_unsorted(vec![t(1, "a", 0), t(2, "b", 0)]))
        .unwrap();
    let index = Arc::new(FakeIndex::with(vec![t(1, "a", 0), t(3, "c", 0)]));
    let session = Arc::new(FakeSession::default());
    let mut c = controller(&settings, &dir, Grant::Granted, &index, &session);

    c.start().unwrap();
    assert_eq!(c.handle_key(key('R')).unwrap(), Control::Continue);
    assert!(c.is_busy());
    settle(&mut c);

    let fresh = Catalog::from_unsorted(vec![t(1, "a", 0), t(3, "c", 0)]);
    assert_eq!(cache.load().unwrap(), Some(fresh.clone()));
    assert!(cache.has_scanned().unwrap());
    assert_eq!(c.app().catalog, fresh);
    // Only the rescan queried the whole index.
    assert_eq!(index.music_calls(), 1);
}
