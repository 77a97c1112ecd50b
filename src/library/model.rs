use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key of a track inside the media index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub display_name: String,
    pub duration_ms: u64,
}

impl Track {
    pub fn new(id: TrackId, display_name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            duration_ms,
        }
    }
}

/// Tracks ordered by `display_name` (byte order, stable for equal names).
///
/// A catalog is only ever replaced as a whole; filtering produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn from_unsorted(mut tracks: Vec<Track>) -> Self {
        // `sort_by` is stable, equal names keep index order.
        tracks.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Track> {
        self.tracks.get(idx)
    }

    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Keep only the tracks for which `keep` is true, preserving order.
    pub fn retain_into(self, mut keep: impl FnMut(&Track) -> bool) -> Self {
        Self {
            tracks: self.tracks.into_iter().filter(|t| keep(t)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
