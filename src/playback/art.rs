use std::path::Path;
use std::sync::Arc;

use lofty::prelude::*;

use crate::library::{MediaIndex, TrackId};
use crate::task::TaskSlot;

/// Cover shown when a track has no usable embedded picture.
pub const FALLBACK_COVER: &str = include_str!("../../assets/fallback_cover.txt");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumArt {
    /// First picture embedded in the file's tags.
    Embedded { mime: Option<String>, bytes: Vec<u8> },
    /// The static fallback cover.
    Fallback,
}

/// Art lookup for `id`: embedded picture first, fallback cover otherwise.
pub fn load_art(index: &dyn MediaIndex, id: TrackId) -> AlbumArt {
    let path = match index.locate(id) {
        Ok(Some(path)) => path,
        Ok(None) => {
            tracing::debug!(%id, "no path for art, using fallback");
            return AlbumArt::Fallback;
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "art lookup failed, using fallback");
            return AlbumArt::Fallback;
        }
    };
    embedded_picture(&path).unwrap_or(AlbumArt::Fallback)
}

fn embedded_picture(path: &Path) -> Option<AlbumArt> {
    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable tags, using fallback");
            return None;
        }
    };
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    let picture = tag.pictures().first()?;
    if picture.data().is_empty() {
        return None;
    }
    Some(AlbumArt::Embedded {
        mime: picture.mime_type().map(|m| m.as_str().to_string()),
        bytes: picture.data().to_vec(),
    })
}

/// Loads art for the player screen off the UI loop.
///
/// Only the latest request is ever delivered; `cancel` on teardown turns a
/// late result into a no-op.
pub struct ArtLoader {
    index: Arc<dyn MediaIndex>,
    slot: TaskSlot<(TrackId, AlbumArt)>,
}

impl ArtLoader {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self {
            index,
            slot: TaskSlot::new("art"),
        }
    }

    pub fn request(&mut self, id: TrackId) {
        let index = Arc::clone(&self.index);
        if let Err(e) = self.slot.spawn(move || (id, load_art(index.as_ref(), id))) {
            tracing::warn!(%id, error = %e, "failed to spawn art loader");
        }
    }

    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    pub fn poll(&mut self) -> Option<(TrackId, AlbumArt)> {
        self.slot.try_take()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_pending()
    }
}
