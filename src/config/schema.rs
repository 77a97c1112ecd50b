use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub permission: PermissionSettings,
    pub marquee: MarqueeSettings,
    pub ui: UiSettings,
    pub playback: PlaybackSettings,
    pub state: StateSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory the media index is built from.
    pub root: PathBuf,
    /// File extensions to treat as music (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during indexing.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields make up a track's display name (and therefore its sort key).
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: default_music_dir(),
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Filename],
            display_separator: " - ".to_string(),
        }
    }
}

fn default_music_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
        .unwrap_or_else(|| PathBuf::from("Music"))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PermissionSettings {
    /// Native prompts issued before the user is sent to the settings screen.
    pub max_asks: u32,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self { max_asks: 2 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarqueeSettings {
    /// Scroll speed in pixels per second.
    pub speed_px_per_sec: f32,
    /// Fraction of the free space used as the initial left offset.
    pub bias: f32,
    /// Fade-in window at the start of each cycle (milliseconds).
    pub fade_in_ms: u64,
    /// Fade-out window at the end of each cycle (milliseconds).
    pub fade_out_ms: u64,
}

impl Default for MarqueeSettings {
    fn default() -> Self {
        Self {
            speed_px_per_sec: 80.0,
            bias: 0.05,
            fade_in_ms: 1600,
            fade_out_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Width of one terminal cell in marquee pixels.
    pub cell_width_px: u16,
    /// Redraw interval while an animation is running (milliseconds).
    pub frame_interval_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ encore ~ ".to_string(),
            cell_width_px: 8,
            frame_interval_ms: 33,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Directory holding persisted prefs, the catalog snapshot and the log.
    /// `None` means `$ENCORE_STATE_DIR` or the platform data dir.
    pub dir: Option<PathBuf>,
}
