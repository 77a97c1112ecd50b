use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::library::{IndexError, Track, TrackId};

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The index no longer knows the track (deleted, moved, unmounted).
    #[error("track {0} no longer exists")]
    Missing(TrackId),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// The audio engine as seen from the UI.
///
/// Implementations are shared across the UI loop and their own worker, so
/// every method takes `&self`.
pub trait PlaybackSession: Send + Sync {
    /// Replace the queue used by next/previous and auto-advance.
    fn set_queue(&self, tracks: Vec<Track>);

    /// Start `track` from the beginning.
    fn start(&self, track: &Track) -> Result<(), PlaybackError>;

    fn play(&self);
    fn pause(&self);

    /// Next in the queue, wrapping to the first. Fails like `start` when
    /// that track is gone.
    fn play_next(&self) -> Result<(), PlaybackError>;
    /// Previous in the queue, wrapping to the last.
    fn play_previous(&self) -> Result<(), PlaybackError>;

    fn is_playing(&self) -> bool;
    /// Time played of the current track.
    fn elapsed(&self) -> Duration;
    fn current_title(&self) -> Option<String>;
    fn current_track(&self) -> Option<TrackId>;
}
