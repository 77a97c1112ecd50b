//! The terminal stand-in for the platform's permission system.
//!
//! Library access is a grant stored in `access.toml`. The native prompt is
//! a system-styled modal that writes the grant, and the settings screen is
//! the user's editor opened on the grant file.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use serde::Deserialize;

use crate::permission::PermissionStatus;

use super::startup::{self, Tui};

pub const ACCESS_FILE: &str = "access.toml";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grant {
    #[default]
    Unset,
    Granted,
    Denied,
}

impl Grant {
    fn as_str(self) -> &'static str {
        match self {
            Grant::Unset => "unset",
            Grant::Granted => "granted",
            Grant::Denied => "denied",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AccessFile {
    #[serde(default)]
    library: Grant,
}

pub struct TerminalHost {
    path: PathBuf,
}

impl TerminalHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored grant; missing or unreadable means unset.
    pub fn grant(&self) -> Grant {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Grant::Unset,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read access grant");
                return Grant::Unset;
            }
        };
        match toml::from_str::<AccessFile>(&text) {
            Ok(file) => file.library,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed access grant");
                Grant::Unset
            }
        }
    }

    pub fn status(&self) -> PermissionStatus {
        match self.grant() {
            Grant::Granted => PermissionStatus::Granted,
            Grant::Unset | Grant::Denied => PermissionStatus::Denied,
        }
    }

    /// Persist the answer to the native prompt.
    pub fn record(&self, grant: Grant) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = format!(
            "# Library access for encore: \"granted\", \"denied\" or \"unset\".\n\
             library = \"{}\"\n",
            grant.as_str()
        );
        fs::write(&self.path, text)?;
        tracing::info!(grant = grant.as_str(), "library access recorded");
        Ok(())
    }

    /// The settings round trip: suspend the TUI, let the user edit the grant
    /// file, then take the terminal back. No result is reported; the caller
    /// re-reads the status.
    pub fn open_settings(&self, terminal: &mut Tui) -> anyhow::Result<()> {
        if !self.path.exists() {
            self.record(self.grant())
                .with_context(|| format!("creating {}", self.path.display()))?;
        }

        let editor = editor_command();
        tracing::info!(%editor, path = %self.path.display(), "opening settings");

        // Editors are often configured with flags, e.g. `code --wait`.
        let mut parts = editor.split_whitespace();
        let program = parts.next().unwrap_or("vi");

        startup::suspend(terminal)?;
        let status = Command::new(program).args(parts).arg(&self.path).status();
        startup::resume(terminal)?;

        match status {
            Ok(s) if !s.success() => tracing::warn!(%editor, code = ?s.code(), "editor exited with an error"),
            Ok(_) => {}
            Err(e) => tracing::warn!(%editor, error = %e, "failed to launch editor"),
        }
        Ok(())
    }
}

/// `$VISUAL`, then `$EDITOR`, then `vi`.
fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|k| env::var(k).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}
