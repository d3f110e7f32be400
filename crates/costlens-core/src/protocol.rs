//! Host protocol: line-delimited JSON between the editor and costlens.
//!
//! Each line from the editor is one [`Request`], tagged by `command`:
//!
//! ```json
//! {"command": "document_activated", "document": "/work/Shop.java", "text": "class Shop { }"}
//! {"command": "enable_for_project", "build_command": "mvn compile"}
//! ```
//!
//! Each line costlens writes back is one [`Event`], tagged by `event`:
//!
//! ```json
//! {"event": "notice", "level": "info", "message": "Cost analysis finished: 4 methods"}
//! ```

use crate::error::CostlensError;
use costlens_drift::Range;
use costlens_ledger::{DocumentId, RecordId};
use serde::{Deserialize, Serialize};

/// A request from the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Analyze the active document and enable file mode.
    EnableForFile,
    /// Build and analyze the project and enable project mode.
    EnableForProject {
        /// Build command, split shell-style.
        build_command: String,
    },
    /// Re-run the analysis of the current mode.
    ReExecute,
    /// In project mode, re-analyze only the active document.
    ReExecuteFileInProject,
    /// Disable costlens and clear decorations and panels.
    Disable,
    /// Delete cost caches and analyzer output.
    CleanOutput,
    /// Exempt a method name from significance checks.
    WhitelistAdd {
        /// Method name.
        name: String,
    },
    /// Remove a whitelist entry.
    WhitelistRemove {
        /// Method name.
        name: String,
    },
    /// Open the history panel of one method.
    OpenDetail {
        /// Method id (`<document>:<method>`).
        method_id: RecordId,
    },
    /// Open the overview panel of the active document.
    OpenOverview {
        /// Method to highlight.
        #[serde(default)]
        selected: Option<String>,
    },
    /// The editor switched to `document`.
    DocumentActivated {
        /// Document path.
        document: DocumentId,
        /// Current text.
        text: String,
    },
    /// `document` was edited.
    DocumentChanged {
        /// Document path.
        document: DocumentId,
        /// Current text.
        text: String,
    },
    /// `document` was saved.
    DocumentSaved {
        /// Document path.
        document: DocumentId,
        /// Saved text.
        text: String,
    },
    /// End the session.
    Shutdown,
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something was rejected or needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// Panels costlens can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Costs of every method in the active document.
    Overview,
    /// Cost history of one method.
    History,
}

/// One decorated method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    /// Method id, for opening the history panel.
    pub method_id: RecordId,
    /// Method name, for opening the overview panel.
    pub method_name: String,
    /// Range of the whole declaration.
    pub declaration_range: Range,
    /// Range of the name token.
    pub name_range: Range,
    /// Hover text on the name.
    pub hover: String,
    /// Highlight as expensive.
    pub expensive: bool,
}

/// An event for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A message for the user.
    Notice {
        /// Severity.
        level: NoticeLevel,
        /// Message text.
        message: String,
    },
    /// Replaces all decorations of `document`.
    Decorations {
        /// Decorated document.
        document: DocumentId,
        /// Set when edits since the last analysis were significant.
        stale: bool,
        /// Decorated methods in record order.
        items: Vec<Decoration>,
    },
    /// Opens or replaces a panel.
    Panel {
        /// Which panel.
        kind: PanelKind,
        /// Panel title.
        title: String,
        /// Full HTML document.
        html: String,
    },
    /// Starts or ends an indeterminate progress indicator.
    Progress {
        /// True while work is running.
        active: bool,
        /// Progress title.
        title: String,
    },
    /// Removes all decorations and closes the listed panels.
    Cleared {
        /// Panels to close.
        panels: Vec<PanelKind>,
    },
}

impl Event {
    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// A warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

impl From<&CostlensError> for Event {
    fn from(err: &CostlensError) -> Self {
        let level = match err {
            CostlensError::NotApplicable(_) | CostlensError::Busy => NoticeLevel::Info,
            CostlensError::InputInvalid(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self::Notice {
            level,
            message: err.to_string(),
        }
    }
}
