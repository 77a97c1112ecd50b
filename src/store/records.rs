use serde::{Deserialize, Serialize};

use crate::library::Catalog;

use super::record::Versioned;

/// How many native permission prompts were issued since the last grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionPrefs {
    pub ask_count: u32,
}

impl Versioned for PermissionPrefs {
    const NAME: &'static str = "permission";
    const VERSION: u32 = 1;
}

/// Scan flag and the last catalog snapshot, written together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPrefs {
    pub has_scanned: bool,
    pub cached_catalog: Option<Catalog>,
}

impl Versioned for AppPrefs {
    const NAME: &'static str = "app";
    const VERSION: u32 = 1;
}
