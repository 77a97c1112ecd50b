//! Fakes shared by unit tests across modules.

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::library::{IndexError, MediaIndex, Track, TrackId};
use crate::playback::{PlaybackError, PlaybackSession};

pub fn t(id: u64, name: &str, duration_ms: u64) -> Track {
    Track::new(TrackId(id), name, duration_ms)
}

/// In-memory media index that counts full queries.
#[derive(Default)]
pub struct FakeIndex {
    entries: Mutex<Vec<Track>>,
    unavailable: AtomicBool,
    broken_lookups: AtomicBool,
    music_calls: AtomicUsize,
}

impl FakeIndex {
    pub fn with(tracks: Vec<Track>) -> Self {
        Self {
            entries: Mutex::new(tracks),
            ..Self::default()
        }
    }

    pub fn remove(&self, id: TrackId) {
        self.entries.lock().unwrap().retain(|t| t.id != id);
    }

    pub fn set_unavailable(&self, v: bool) {
        self.unavailable.store(v, Ordering::SeqCst);
    }

    pub fn set_broken_lookups(&self, v: bool) {
        self.broken_lookups.store(v, Ordering::SeqCst);
    }

    pub fn music_calls(&self) -> usize {
        self.music_calls.load(Ordering::SeqCst)
    }

}

pub fn index_offline() -> IndexError {
    IndexError::Unavailable {
        root: PathBuf::from("/fake"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake index offline"),
    }
}

impl MediaIndex for FakeIndex {
    fn music(&self) -> Result<Vec<Track>, IndexError> {
        self.music_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(index_offline());
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    fn contains(&self, id: TrackId) -> Result<bool, IndexError> {
        if self.broken_lookups.load(Ordering::SeqCst) {
            return Err(index_offline());
        }
        Ok(self.entries.lock().unwrap().iter().any(|t| t.id == id))
    }

    fn locate(&self, id: TrackId) -> Result<Option<PathBuf>, IndexError> {
        Ok(self
            .contains(id)?
            .then(|| PathBuf::from(format!("/fake/{}", id))))
    }
}

/// Scripted playback session recording every call it receives.
#[derive(Default)]
pub struct FakeSession {
    pub queue: Mutex<Vec<Track>>,
    pub current: Mutex<Option<Track>>,
    pub playing: AtomicBool,
    pub missing: Mutex<Vec<TrackId>>,
    /// Every `start` fails as if the index went away.
    pub index_offline: AtomicBool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeSession {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, track: &Track) -> Result<(), PlaybackError> {
        if self.index_offline.load(Ordering::SeqCst) {
            return Err(PlaybackError::Index(index_offline()));
        }
        if self.missing.lock().unwrap().contains(&track.id) {
            return Err(PlaybackError::Missing(track.id));
        }
        Ok(())
    }

    fn step(&self, delta: isize) -> Result<(), PlaybackError> {
        let queue = self.queue.lock().unwrap();
        if queue.is_empty() {
            return Ok(());
        }
        let mut current = self.current.lock().unwrap();
        let pos = current
            .as_ref()
            .and_then(|c| queue.iter().position(|t| t.id == c.id))
            .unwrap_or(0) as isize;
        let next = &queue[(pos + delta).rem_euclid(queue.len() as isize) as usize];
        self.check(next)?;
        *current = Some(next.clone());
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl PlaybackSession for FakeSession {
    fn set_queue(&self, tracks: Vec<Track>) {
        self.calls.lock().unwrap().push("set_queue");
        *self.queue.lock().unwrap() = tracks;
    }

    fn start(&self, track: &Track) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push("start");
        self.check(track)?;
        *self.current.lock().unwrap() = Some(track.clone());
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn play(&self) {
        self.calls.lock().unwrap().push("play");
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.calls.lock().unwrap().push("pause");
        self.playing.store(false, Ordering::SeqCst);
    }

    fn play_next(&self) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push("play_next");
        self.step(1)
    }

    fn play_previous(&self) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push("play_previous");
        self.step(-1)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }

    fn current_title(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.display_name.clone())
    }

    fn current_track(&self) -> Option<TrackId> {
        self.current.lock().unwrap().as_ref().map(|t| t.id)
    }
}
