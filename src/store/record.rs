use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A record type with a file name, a schema version and defaults.
pub trait Versioned: Serialize + DeserializeOwned + Default {
    /// File stem inside the state directory.
    const NAME: &'static str;
    const VERSION: u32;
}

const VERSION_KEY: &str = "version";

/// A single persisted record of type `T`.
pub struct Record<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record").field("path", &self.path).finish()
    }
}

impl<T: Versioned> Record<T> {
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", T::NAME)),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record, or its defaults when the file is absent.
    ///
    /// Unparsable content and unknown versions are logged and read as
    /// defaults; only I/O failures other than "not found" are errors.
    pub fn load(&self) -> Result<T, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unparsable record, using defaults");
                return Ok(T::default());
            }
        };

        let version = value.get(VERSION_KEY).and_then(|v| v.as_u64());
        if version != Some(u64::from(T::VERSION)) {
            tracing::warn!(
                path = %self.path.display(),
                found = ?version,
                expected = T::VERSION,
                "record version mismatch, using defaults"
            );
            return Ok(T::default());
        }

        match serde_json::from_value(value) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed record, using defaults");
                Ok(T::default())
            }
        }
    }

    /// Replace the record on disk atomically (temp file + rename).
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let mut doc = serde_json::to_value(value)?;
        if let Some(map) = doc.as_object_mut() {
            map.insert(VERSION_KEY.to_string(), T::VERSION.into());
        }

        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &doc)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Load, mutate and save in one step. Returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let mut value = self.load()?;
        let out = f(&mut value);
        self.save(&value)?;
        Ok(out)
    }
}
