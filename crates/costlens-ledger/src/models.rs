//! # Core Data Models for the Cost Ledger
//!
//! This module defines the types shared by every costlens crate: document and
//! record identities, the normalized cost record, and the ledger error type.
//!
//! ## Identity Rules
//!
//! | Type | Derived from | Stable across |
//! |------|--------------|---------------|
//! | [`DocumentId`] | Absolute path reported by the editor | Edits, re-analysis |
//! | [`RecordId`] | `"<document path>:<method name>"` | Re-analysis of the same file |
//!
//! Overloaded methods share a [`RecordId`]. The history ledger therefore
//! interleaves their estimates; matching against declarations is best-effort
//! and first-match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Method name the analyzer reports for Java constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Method name the analyzer reports for static initializers.
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

/// Identity of a source document.
///
/// The editor hands documents over by absolute path; two documents are the
/// same if and only if their paths are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a document identity from a path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the underlying path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path as a [`Path`].
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// File name without directories (`Foo.java`).
    pub fn file_name(&self) -> &str {
        self.as_path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.0)
    }

    /// File name without directories or extension (`Foo`).
    pub fn file_stem(&self) -> &str {
        self.as_path()
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.0)
    }

    /// Returns true if the document is a Java source file.
    pub fn is_java(&self) -> bool {
        self.as_path()
            .extension()
            .is_some_and(|ext| ext == "java")
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for DocumentId {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl From<&Path> for DocumentId {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// Stable per-method key: `"<document path>:<method name>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Derives the key for `method_name` in `document`.
    pub fn new(document: &DocumentId, method_name: &str) -> Self {
        Self(format!("{}:{}", document.as_str(), method_name))
    }

    /// Wraps an already-formatted key, e.g. one received from the editor.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source location of a method as reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as written in the report (usually workspace-relative).
    pub file: String,

    /// 1-based line number of the declaration.
    pub lnum: u32,
}

/// One cost dimension of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// Human-readable cost polynomial, e.g. `"6 + 3 ⋅ n"`.
    pub polynomial: String,

    /// Polynomial degree. `None` when the analyzer could not bound the cost.
    pub degree: Option<u32>,

    /// Human-readable asymptotic class, e.g. `"O(n)"`.
    pub big_o: String,
}

impl Cost {
    /// Returns true if the analyzer reported an unbounded cost.
    pub fn is_unbounded(&self) -> bool {
        self.degree.is_none()
    }
}

/// A normalized per-method cost estimate.
///
/// Records are immutable once created: the ledger stamps a copy rather than
/// the live record, so the record held by the store never carries a
/// timestamp.
///
/// # Example
///
/// ```rust
/// use costlens_ledger::{Cost, CostRecord, DocumentId, Location, RecordId};
///
/// let document = DocumentId::new("/src/Foo.java");
/// let record = CostRecord {
///     id: RecordId::new(&document, "bar"),
///     method_name: "bar".to_string(),
///     location: Location { file: "Foo.java".to_string(), lnum: 3 },
///     alloc_cost: Cost { polynomial: "0".to_string(), degree: Some(0), big_o: "O(1)".to_string() },
///     exec_cost: Cost { polynomial: "n".to_string(), degree: Some(1), big_o: "O(n)".to_string() },
///     timestamp: None,
/// };
///
/// let stamped = record.stamped("10/19/2026, 14:03:22");
/// assert!(record.timestamp.is_none());
/// assert_eq!(stamped.timestamp.as_deref(), Some("10/19/2026, 14:03:22"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Stable per-method key.
    pub id: RecordId,

    /// Simple method name; not unique within a file when overloaded.
    pub method_name: String,

    /// Declaration location.
    pub location: Location,

    /// Allocation cost.
    pub alloc_cost: Cost,

    /// Execution cost.
    pub exec_cost: Cost,

    /// Capture time, present only on history entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl CostRecord {
    /// Returns a copy of this record carrying `timestamp`.
    #[must_use]
    pub fn stamped(&self, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            ..self.clone()
        }
    }

    /// Returns true if both records carry the same execution polynomial.
    pub fn same_exec_cost(&self, other: &CostRecord) -> bool {
        self.exec_cost.polynomial == other.exec_cost.polynomial
    }

    /// Returns true for constructors and static initializers.
    pub fn is_initializer(&self) -> bool {
        self.method_name == CONSTRUCTOR_NAME || self.method_name == STATIC_INITIALIZER_NAME
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to open, read or write the database.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Failed to serialize or deserialize stored data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The analyzer report does not match the expected shape.
    #[error("Malformed cost report: {0}")]
    MalformedReport(String),

    /// A whitelist entry was empty after trimming.
    #[error("Invalid method name: {0:?}")]
    InvalidName(String),

    /// A stored key or value could not be decoded.
    #[error("Corrupt ledger entry: {0}")]
    CorruptEntry(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(polynomial: &str, degree: Option<u32>) -> Cost {
        Cost {
            polynomial: polynomial.to_string(),
            degree,
            big_o: "O(n)".to_string(),
        }
    }

    #[test]
    fn test_record_id_format() {
        let document = DocumentId::new("/work/src/A.java");
        assert_eq!(RecordId::new(&document, "foo").as_str(), "/work/src/A.java:foo");
    }

    #[test]
    fn test_document_name_parts() {
        let document = DocumentId::new("/work/src/Account.java");
        assert_eq!(document.file_name(), "Account.java");
        assert_eq!(document.file_stem(), "Account");
        assert!(document.is_java());
        assert!(!DocumentId::new("/work/notes.txt").is_java());
    }

    #[test]
    fn test_stamped_leaves_original_untouched() {
        let document = DocumentId::new("A.java");
        let record = CostRecord {
            id: RecordId::new(&document, "foo"),
            method_name: "foo".to_string(),
            location: Location {
                file: "A.java".to_string(),
                lnum: 1,
            },
            alloc_cost: cost("1", Some(0)),
            exec_cost: cost("n", Some(1)),
            timestamp: None,
        };

        let stamped = record.stamped("now");
        assert!(record.timestamp.is_none());
        assert_eq!(stamped.timestamp.as_deref(), Some("now"));
        assert!(record.same_exec_cost(&stamped));
    }

    #[test]
    fn test_unbounded_cost() {
        assert!(cost("Top", None).is_unbounded());
        assert!(!cost("n", Some(1)).is_unbounded());
    }

    #[test]
    fn test_live_record_serializes_without_timestamp() {
        let document = DocumentId::new("A.java");
        let record = CostRecord {
            id: RecordId::new(&document, "foo"),
            method_name: "foo".to_string(),
            location: Location {
                file: "A.java".to_string(),
                lnum: 1,
            },
            alloc_cost: cost("1", Some(0)),
            exec_cost: cost("n", Some(1)),
            timestamp: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["id"], "A.java:foo");
    }
}
