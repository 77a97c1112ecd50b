//! Playback: the session seam, its rodio implementation, album art and the
//! view sync that keeps both title views current.

mod art;
mod engine;
mod session;
mod sync;

pub use art::{AlbumArt, ArtLoader, FALLBACK_COVER, load_art};
pub use engine::{NowPlaying, NowPlayingHandle, RodioSession};
pub use session::{PlaybackError, PlaybackSession};
pub use sync::{PlaybackViewSync, TitleView};
