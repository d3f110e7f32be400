//! Configuration types for costlens.
//!
//! Every section has defaults, and a configuration file only needs to name
//! the values it changes:
//!
//! ```json
//! { "analyzer": { "binary": "/opt/infer/bin/infer" }, "display": { "expensive_degree": 3 } }
//! ```

use crate::{error::CostlensError, Result};
use costlens_ledger::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Configuration for a costlens session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostlensConfig {
    /// Analyzer invocation.
    pub analyzer: AnalyzerConfig,

    /// Workspace layout.
    pub workspace: WorkspaceConfig,

    /// History and whitelist persistence.
    pub ledger: LedgerConfig,

    /// Decoration and panel rendering.
    pub display: DisplayConfig,

    /// Global settings.
    pub global: GlobalConfig,
}

impl CostlensConfig {
    /// Loads a JSON configuration file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `CostlensError::Config` if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let bytes = std::fs::read(path)
            .map_err(|e| CostlensError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CostlensError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Directory holding the persisted cost caches.
    pub fn cache_dir(&self) -> PathBuf {
        self.workspace.root.join(&self.workspace.cache_dir)
    }

    /// Makes `workspace.root` absolute against `cwd`. Report paths and editor
    /// paths only name the same document once the root is absolute.
    pub fn resolve_workspace_root(&mut self, cwd: &Path) {
        self.workspace.root = resolve_path(cwd, &self.workspace.root);
    }
}

/// Joins `path` onto `base` unless `path` is absolute, then drops `.` and
/// folds `..` components. The filesystem is not consulted, so symlinks are
/// kept as written.
///
/// ```rust
/// use costlens_core::resolve_path;
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve_path(Path::new("/work/app"), Path::new("./src/../Shop.java"));
/// assert_eq!(resolved, PathBuf::from("/work/app/Shop.java"));
/// ```
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in base.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

/// Analyzer invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Analyzer executable, looked up on `PATH` when relative.
    pub binary: PathBuf,

    /// Parent directory of the per-run output directories.
    pub output_dir: PathBuf,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("infer"),
            output_dir: std::env::temp_dir().join("infer-out"),
        }
    }
}

/// Workspace layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root. Project builds run here and report paths resolve
    /// against it.
    pub root: PathBuf,

    /// Cache directory, relative to `root`.
    pub cache_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            cache_dir: PathBuf::from("infer-out-vscode"),
        }
    }
}

/// Ledger persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path to the ledger database.
    pub db_path: PathBuf,

    /// Maximum entries kept per method; `null` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./costlens_ledger.db"),
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Execution-cost degree from which a method is highlighted as expensive.
    /// Unbounded costs are always expensive.
    pub expensive_degree: u32,

    /// Leave constructors out of the overview panel.
    pub hide_constructors: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            expensive_degree: 2,
            hide_constructors: true,
        }
    }
}

/// Global settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Re-run the analyzer when a save is significant instead of only
    /// flagging the costs as stale.
    pub reexecute_on_significant_save: bool,
}
