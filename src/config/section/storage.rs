//! `[storage]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! dir = "~/Pictures/frame"   # Shared photo directory (relative to config file)
//! max_files = 50             # Files accepted per upload request
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Photo storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Photo directory. `~` is expanded; relative paths resolve against
    /// the config file's directory.
    pub dir: PathBuf,

    /// Maximum number of files in one upload.
    pub max_files: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("photos"),
            max_files: 50,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.as_os_str().is_empty() {
            diag.error(FieldPath::new("storage.dir"), "must not be empty");
        }
        if self.max_files == 0 {
            diag.error(FieldPath::new("storage.max_files"), "must be at least 1");
        }
    }
}
