use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use lofty::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;
use xxhash_rust::xxh64::xxh64;

use crate::config::LibrarySettings;

use super::display::TagView;
use super::model::{Track, TrackId};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("media root {} is not readable: {source}", .root.display())]
    Unavailable {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("media index registry lock poisoned")]
    Poisoned,
}

/// A queryable, read-only table of on-device tracks that other processes
/// may change at any time.
pub trait MediaIndex: Send + Sync {
    /// Every entry flagged as music, unordered.
    fn music(&self) -> Result<Vec<Track>, IndexError>;

    /// Point query: is `id` still present in the index?
    fn contains(&self, id: TrackId) -> Result<bool, IndexError>;

    /// Location of the audio for `id`, if the index still has it.
    fn locate(&self, id: TrackId) -> Result<Option<PathBuf>, IndexError>;
}

/// Media index over a music directory.
///
/// Ids are derived from the path relative to the root so they survive
/// restarts. Point queries go through an id -> path registry that is built
/// by the first query of any kind and refreshed by every full query.
pub struct DirectoryIndex {
    settings: LibrarySettings,
    registry: RwLock<Option<HashMap<TrackId, PathBuf>>>,
}

impl DirectoryIndex {
    pub fn new(settings: LibrarySettings) -> Self {
        Self {
            settings,
            registry: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    /// Stable id for the file at `path` under this index's root.
    pub fn id_for(&self, path: &Path) -> TrackId {
        let rel = path.strip_prefix(&self.settings.root).unwrap_or(path);
        TrackId(xxh64(rel.to_string_lossy().as_bytes(), 0))
    }

    fn music_paths(&self) -> Result<Vec<PathBuf>, IndexError> {
        let settings = &self.settings;
        fs::read_dir(&settings.root).map_err(|source| IndexError::Unavailable {
            root: settings.root.clone(),
            source,
        })?;

        let mut walker = WalkDir::new(&settings.root).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let paths = walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_music_file(p, settings))
            .collect();
        Ok(paths)
    }

    fn read_track(&self, path: &Path) -> Track {
        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist: Option<String> = None;
        let mut album: Option<String> = None;
        let mut duration_ms = 0u64;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration_ms = tagged.properties().duration().as_millis() as u64;

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title() {
                        if !v.trim().is_empty() {
                            title = v.to_string();
                        }
                    }
                    artist = tag
                        .artist()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty());
                    album = tag
                        .album()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty());
                }
            }
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "no readable tags"),
        }

        let display_name = TagView {
            path,
            title: &title,
            artist: artist.as_deref(),
            album: album.as_deref(),
        }
        .display_name(&self.settings.display_fields, &self.settings.display_separator);

        Track::new(self.id_for(path), display_name, duration_ms)
    }

    fn lookup(&self, id: TrackId) -> Result<Option<PathBuf>, IndexError> {
        {
            let guard = self.registry.read().map_err(|_| IndexError::Poisoned)?;
            if let Some(registry) = guard.as_ref() {
                return Ok(registry.get(&id).cloned());
            }
        }

        let registry: HashMap<TrackId, PathBuf> = self
            .music_paths()?
            .into_iter()
            .map(|p| (self.id_for(&p), p))
            .collect();
        let found = registry.get(&id).cloned();
        *self.registry.write().map_err(|_| IndexError::Poisoned)? = Some(registry);
        Ok(found)
    }
}

impl MediaIndex for DirectoryIndex {
    fn music(&self) -> Result<Vec<Track>, IndexError> {
        let paths = self.music_paths()?;

        let mut registry = HashMap::with_capacity(paths.len());
        let mut tracks = Vec::with_capacity(paths.len());
        for path in paths {
            let track = self.read_track(&path);
            registry.insert(track.id, path);
            tracks.push(track);
        }

        *self.registry.write().map_err(|_| IndexError::Poisoned)? = Some(registry);
        tracing::debug!(root = %self.settings.root.display(), count = tracks.len(), "indexed music");
        Ok(tracks)
    }

    fn contains(&self, id: TrackId) -> Result<bool, IndexError> {
        Ok(self.locate(id)?.is_some())
    }

    fn locate(&self, id: TrackId) -> Result<Option<PathBuf>, IndexError> {
        // Files deleted behind our back drop out of the index.
        Ok(self.lookup(id)?.filter(|p| p.is_file()))
    }
}

fn is_music_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackDisplayField;
    use tempfile::tempdir;

    fn settings_for(root: &Path) -> LibrarySettings {
        LibrarySettings {
            root: root.to_path_buf(),
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        }
    }

    #[test]
    fn is_music_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_music_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_music_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_music_file(Path::new("/tmp/a.flac"), &settings));
        assert!(!is_music_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_music_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn music_filters_non_music_and_uses_filename_display() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

        let index = DirectoryIndex::new(settings_for(dir.path()));
        let mut names: Vec<String> = index
            .music()
            .unwrap()
            .into_iter()
            .map(|t| t.display_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["A".to_string(), "b".to_string()]);
    }

    #[test]
    fn ids_are_stable_across_index_instances() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("song.mp3"), b"x").unwrap();

        let first = DirectoryIndex::new(settings_for(dir.path())).music().unwrap();
        let second = DirectoryIndex::new(settings_for(dir.path())).music().unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn contains_builds_registry_on_cold_start_and_sees_deletions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.mp3");
        fs::write(&path, b"x").unwrap();

        let index = DirectoryIndex::new(settings_for(dir.path()));
        let id = index.id_for(&path);
        assert!(index.contains(id).unwrap());
        assert_eq!(index.locate(id).unwrap(), Some(path.clone()));

        fs::remove_file(&path).unwrap();
        assert!(!index.contains(id).unwrap());
        assert!(!index.contains(TrackId(42)).unwrap());
    }

    #[test]
    fn missing_root_is_unavailable() {
        let dir = tempdir().unwrap();
        let index = DirectoryIndex::new(settings_for(&dir.path().join("nope")));
        assert!(matches!(index.music(), Err(IndexError::Unavailable { .. })));
    }

    #[test]
    fn hidden_files_are_skipped_unless_enabled() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"x").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"x").unwrap();

        let index = DirectoryIndex::new(settings_for(dir.path()));
        let tracks = index.music().unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].display_name, "visible");

        let index = DirectoryIndex::new(LibrarySettings {
            include_hidden: true,
            ..settings_for(dir.path())
        });
        assert_eq!(index.music().unwrap().len(), 2);
    }

    #[test]
    fn recursion_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"x").unwrap();
        fs::write(d1.join("one.mp3"), b"x").unwrap();
        fs::write(d2.join("two.mp3"), b"x").unwrap();

        let index = DirectoryIndex::new(LibrarySettings {
            max_depth: Some(2),
            ..settings_for(dir.path())
        });
        let names: Vec<String> = index
            .music()
            .unwrap()
            .into_iter()
            .map(|t| t.display_name)
            .collect();
        assert!(names.contains(&"root".to_string()));
        assert!(names.contains(&"one".to_string()));
        assert!(!names.contains(&"two".to_string()));

        let index = DirectoryIndex::new(LibrarySettings {
            recursive: false,
            ..settings_for(dir.path())
        });
        assert_eq!(index.music().unwrap().len(), 1);
    }
}
