//! Document snapshots: the last-known text of each document, used as the
//! baseline for change-significance checks.
//!
//! The cache never decides when to replace a baseline. Callers replace it
//! after every check, whatever the outcome, and after every successful
//! re-analysis; a run of insignificant edits is therefore always compared
//! against the previous edit rather than an ever-older baseline.

use costlens_ledger::DocumentId;
use std::collections::HashMap;

/// Document → last-known text.
#[derive(Debug, Default, Clone)]
pub struct SnapshotCache {
    texts: HashMap<DocumentId, String>,
}

impl SnapshotCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline text of `document`.
    pub fn get(&self, document: &DocumentId) -> Option<&str> {
        self.texts.get(document).map(String::as_str)
    }

    /// Stores `text` as the baseline of `document`, returning the previous one.
    pub fn replace(&mut self, document: DocumentId, text: impl Into<String>) -> Option<String> {
        self.texts.insert(document, text.into())
    }

    /// Stores `text` only if `document` has no baseline yet. Returns true if
    /// it was stored.
    pub fn insert_if_absent(&mut self, document: DocumentId, text: impl Into<String>) -> bool {
        if self.texts.contains_key(&document) {
            return false;
        }
        self.texts.insert(document, text.into());
        true
    }

    /// Drops every baseline.
    pub fn clear(&mut self) {
        self.texts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first_baseline() {
        let mut cache = SnapshotCache::new();
        let doc = DocumentId::new("A.java");

        assert!(cache.insert_if_absent(doc.clone(), "v1"));
        assert!(!cache.insert_if_absent(doc.clone(), "v2"));
        assert_eq!(cache.get(&doc), Some("v1"));
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut cache = SnapshotCache::new();
        let doc = DocumentId::new("A.java");

        assert!(cache.replace(doc.clone(), "v1").is_none());
        assert_eq!(cache.replace(doc.clone(), "v2").as_deref(), Some("v1"));
        assert_eq!(cache.get(&doc), Some("v2"));
    }
}
