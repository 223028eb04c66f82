//! Persistence configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DATABASE_FILE;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Relative paths resolve against the config root.
    /// Default: "alvox.db".
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn effective_path(&self, root: &Path) -> PathBuf {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE));
        if path.is_absolute() {
            path
        } else {
            root.join(path)
        }
    }
}
