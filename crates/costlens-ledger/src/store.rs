//! In-memory Cost Record Store.
//!
//! Maps each document to the record list of its last successful analysis and
//! tracks which list is currently on screen. The two are decoupled: switching
//! editor tabs changes what is displayed without touching what was computed,
//! and a fresh analysis of a background document does not repaint the
//! foreground one.

use crate::models::{CostRecord, DocumentId};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared, immutable record list.
pub type RecordList = Arc<[CostRecord]>;

/// Document → record list mapping plus the displayed list.
#[derive(Debug, Default, Clone)]
pub struct CostStore {
    costs: HashMap<DocumentId, RecordList>,
    current: Option<RecordList>,
}

impl CostStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the record list of `document` wholesale and returns the
    /// stored list.
    pub fn set_costs(&mut self, document: DocumentId, records: Vec<CostRecord>) -> RecordList {
        let records: RecordList = Arc::from(records);
        self.costs.insert(document, Arc::clone(&records));
        records
    }

    /// Returns the last list set for `document`, if it was ever analyzed.
    pub fn get_costs(&self, document: &DocumentId) -> Option<RecordList> {
        self.costs.get(document).cloned()
    }

    /// Designates `records` as the displayed list.
    pub fn set_current(&mut self, records: RecordList) {
        self.current = Some(records);
    }

    /// The displayed list, empty if nothing was designated.
    pub fn current(&self) -> &[CostRecord] {
        self.current.as_deref().unwrap_or(&[])
    }

    /// Returns true if a displayed list has been designated.
    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    /// Drops the displayed list without touching per-document lists.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Removes the list of `document`.
    pub fn remove(&mut self, document: &DocumentId) -> Option<RecordList> {
        self.costs.remove(document)
    }

    /// Removes every list, including the displayed one.
    pub fn clear(&mut self) {
        self.costs.clear();
        self.current = None;
    }

    /// Documents with a stored list.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentId> {
        self.costs.keys()
    }

    /// Number of documents with a stored list.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    /// Returns true if no document has a stored list.
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cost, Location, RecordId};

    fn record(document: &DocumentId, name: &str, poly: &str) -> CostRecord {
        let cost = Cost {
            polynomial: poly.to_string(),
            degree: Some(1),
            big_o: "O(n)".to_string(),
        };
        CostRecord {
            id: RecordId::new(document, name),
            method_name: name.to_string(),
            location: Location {
                file: document.file_name().to_string(),
                lnum: 1,
            },
            alloc_cost: cost.clone(),
            exec_cost: cost,
            timestamp: None,
        }
    }

    #[test]
    fn test_get_unknown_document() {
        let store = CostStore::new();
        assert!(store.get_costs(&DocumentId::new("A.java")).is_none());
        assert!(store.current().is_empty());
        assert!(!store.has_current());
    }

    #[test]
    fn test_set_costs_replaces_wholesale() {
        let mut store = CostStore::new();
        let doc = DocumentId::new("A.java");

        store.set_costs(doc.clone(), vec![record(&doc, "foo", "n"), record(&doc, "bar", "1")]);
        store.set_costs(doc.clone(), vec![record(&doc, "baz", "n^2")]);

        let costs = store.get_costs(&doc).unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].method_name, "baz");
    }

    #[test]
    fn test_current_is_decoupled_from_document_list() {
        let mut store = CostStore::new();
        let a = DocumentId::new("A.java");
        let b = DocumentId::new("B.java");

        let a_costs = store.set_costs(a.clone(), vec![record(&a, "foo", "n")]);
        store.set_current(a_costs);

        // A background analysis of B does not change what is displayed.
        store.set_costs(b.clone(), vec![record(&b, "bar", "1")]);
        assert_eq!(store.current()[0].method_name, "foo");

        // Re-analysis of A does not repaint until designated again.
        store.set_costs(a.clone(), vec![record(&a, "foo", "n^2")]);
        assert_eq!(store.current()[0].exec_cost.polynomial, "n");
    }

    #[test]
    fn test_clear() {
        let mut store = CostStore::new();
        let a = DocumentId::new("A.java");
        let list = store.set_costs(a.clone(), vec![record(&a, "foo", "n")]);
        store.set_current(list);

        store.clear();
        assert!(store.is_empty());
        assert!(store.current().is_empty());
    }
}
