//! Persisted application state.
//!
//! Each record is a small versioned JSON document in the state directory.
//! Reads fall back to the record's defaults, writes replace the file
//! atomically, and `Record::update` is the one read-modify-write path.

mod record;
mod records;

pub use record::{Record, StoreError, Versioned};
pub use records::{AppPrefs, PermissionPrefs};

use std::path::{Path, PathBuf};

/// Handles to both persisted records living under one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    permission: Record<PermissionPrefs>,
    app: Record<AppPrefs>,
}

impl StateStore {
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            permission: Record::open(&dir),
            app: Record::open(&dir),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn permission(&self) -> &Record<PermissionPrefs> {
        &self.permission
    }

    pub fn app(&self) -> &Record<AppPrefs> {
        &self.app
    }
}
