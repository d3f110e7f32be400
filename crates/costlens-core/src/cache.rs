//! Persisted cost caches.
//!
//! The last successful analysis of each kind is written to the workspace so
//! enabling costlens in a later session can show costs without re-running
//! the analyzer:
//!
//! ```text
//! <workspace>/infer-out-vscode/
//! ├── project-costs.json
//! └── file-<stem>-costs.json
//! ```
//!
//! Unreadable caches are treated as absent.

use crate::Result;
use costlens_ledger::{CostRecord, DocumentId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Costs of one document as stored in a cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDocument {
    /// Document the records belong to.
    pub document: DocumentId,
    /// Records in line order.
    pub records: Vec<CostRecord>,
}

/// Cache file location and access.
#[derive(Debug, Clone)]
pub struct CostCache {
    dir: PathBuf,
}

impl CostCache {
    /// Creates a cache rooted at `dir`. Nothing is created until a write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the project cache.
    pub fn project_path(&self) -> PathBuf {
        self.dir.join("project-costs.json")
    }

    /// Path of the cache for a single file with stem `stem`.
    pub fn file_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("file-{}-costs.json", stem))
    }

    /// Reads a cache file. Missing or unreadable files yield `None`.
    pub fn load(&self, path: &Path) -> Option<Vec<CachedDocument>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(documents) => {
                debug!("Loaded cache {}", path.display());
                Some(documents)
            }
            Err(e) => {
                warn!("Ignoring malformed cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes a cache file, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn store(&self, path: &Path, documents: &[CachedDocument]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(documents).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        debug!("Wrote cache {}", path.display());
        Ok(())
    }

    /// Deletes the cache directory. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory exists but cannot be removed.
    pub fn clean(&self) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.dir)?;
        Ok(true)
    }
}
