//! Watch-path declarations
//!
//! The core never watches files itself; adapters declare exactly which
//! paths a file-watch subsystem must observe for external changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One path a file watcher should observe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchPath {
    pub path: PathBuf,
    /// Directories holding many tool files are watched recursively;
    /// single config files are watched via their parent, non-recursively
    pub recursive: bool,
}

impl WatchPath {
    /// Recursive watch over a directory of tool files
    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    /// Non-recursive watch of a single config file's parent directory
    pub fn file_parent(file: impl Into<PathBuf>) -> Option<Self> {
        let file: PathBuf = file.into();
        file.parent().map(|parent| Self {
            path: parent.to_path_buf(),
            recursive: false,
        })
    }
}
