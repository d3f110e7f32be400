//! # Integration Tests for the Cost Ledger
//!
//! ## Test Categories
//!
//! 1. **History**: de-duplication scenarios across analysis passes
//! 2. **Persistence**: write-through of histories and whitelist
//! 3. **End-to-End**: report → store → ledger

use crate::ledger::CostLedger;
use crate::models::{Cost, CostRecord, DocumentId, Location, RecordId};
use crate::report::parse_report;
use crate::store::CostStore;
use chrono::{Local, TimeZone};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn cost(poly: &str) -> Cost {
    Cost {
        polynomial: poly.to_string(),
        degree: Some(2),
        big_o: "O(n^2)".to_string(),
    }
}

fn item(id: &str, name: &str, exec: &str) -> CostRecord {
    CostRecord {
        id: RecordId::from_key(id),
        method_name: name.to_string(),
        location: Location {
            file: "A.java".to_string(),
            lnum: 4,
        },
        alloc_cost: cost("0"),
        exec_cost: cost(exec),
        timestamp: None,
    }
}

fn minute(m: u32) -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, 12, m, 0).unwrap()
}

// =============================================================================
// History Tests
// =============================================================================

#[test]
fn test_scenario_identical_then_changed_polynomial() {
    let mut ledger = CostLedger::temporary(None).unwrap();
    let id = RecordId::from_key("A:foo");

    ledger.record_all(&[item("A:foo", "foo", "n^2")], minute(0)).unwrap();
    ledger.record_all(&[item("A:foo", "foo", "n^2")], minute(1)).unwrap();
    assert_eq!(ledger.history(&id).unwrap().len(), 1);

    ledger.record_all(&[item("A:foo", "foo", "n^3")], minute(2)).unwrap();
    let history = ledger.history(&id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].exec_cost.polynomial, "n^3");
    assert_eq!(history[0].timestamp.as_deref(), Some("10/19/2026, 12:02:00"));
}

#[test]
fn test_dedup_never_changes_length() {
    let mut ledger = CostLedger::temporary(None).unwrap();
    let id = RecordId::from_key("A:foo");

    for poly in ["1", "n", "n", "n^2", "n^2", "n^2"] {
        let before = ledger.history(&id).map_or(0, |h| h.len());
        let head_same = ledger
            .history(&id)
            .and_then(|h| h.front())
            .is_some_and(|head| head.exec_cost.polynomial == poly);

        ledger.record_all(&[item("A:foo", "foo", poly)], minute(0)).unwrap();

        let after = ledger.history(&id).unwrap().len();
        if head_same {
            assert_eq!(before, after);
        } else {
            assert_eq!(before + 1, after);
        }
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_on_disk_ledger_writes_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = CostLedger::new(dir.path().join("ledger.db"), Some(5)).unwrap();

    ledger.record_all(&[item("A:foo", "foo", "n")], minute(0)).unwrap();
    ledger.add_to_whitelist("toString").unwrap();
    ledger.flush().unwrap();

    assert_eq!(ledger.history_len(), 1);
    assert!(ledger.is_whitelisted("toString"));
    assert!(ledger.remove_from_whitelist("toString").unwrap());
    assert!(!ledger.is_whitelisted("toString"));
}

#[test]
fn test_overloads_do_not_grow_history_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let id = RecordId::from_key("A:find");
    let pass = [item("A:find", "find", "n"), item("A:find", "find", "n^2")];

    {
        let mut ledger = CostLedger::new(&path, Some(3)).unwrap();
        for m in 0..5 {
            ledger.record_all(&pass, minute(m)).unwrap();
        }
        assert_eq!(ledger.history(&id).unwrap().len(), 1);
        ledger.flush().unwrap();
    }

    let mut ledger = CostLedger::new(&path, Some(3)).unwrap();
    assert!(ledger.record_all(&pass, minute(10)).unwrap().is_empty());
    let history = ledger.history(&id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].exec_cost.polynomial, "n");
    assert_eq!(history[0].timestamp.as_deref(), Some("10/19/2026, 12:00:00"));
}

#[test]
fn test_invalid_whitelist_name_is_not_stored() {
    let mut ledger = CostLedger::temporary(None).unwrap();
    assert!(ledger.add_to_whitelist("  ").is_err());
    assert!(ledger.whitelist().is_empty());
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_report_to_store_to_ledger() {
    let report = json!([
        {
            "procedure_name": "<init>",
            "loc": {"file": "Calc.java", "lnum": 1},
            "alloc_cost": {"hum": {"hum_polynomial": "0", "hum_degree": "0", "big_o": "O(1)"}},
            "exec_cost": {"hum": {"hum_polynomial": "3", "hum_degree": "0", "big_o": "O(1)"}}
        },
        {
            "procedure_name": "sum",
            "loc": {"file": "Calc.java", "lnum": 5},
            "alloc_cost": {"hum": {"hum_polynomial": "0", "hum_degree": "0", "big_o": "O(1)"}},
            "exec_cost": {"hum": {"hum_polynomial": "5 + 3 ⋅ n", "hum_degree": "1", "big_o": "O(n)"}}
        }
    ]);

    let document = DocumentId::new("/work/Calc.java");
    let records = parse_report(&serde_json::to_vec(&report).unwrap(), |_| document.clone()).unwrap();
    assert!(records[0].is_initializer());

    let mut store = CostStore::new();
    let list = store.set_costs(document.clone(), records.clone());
    store.set_current(list);

    let mut ledger = CostLedger::temporary(None).unwrap();
    let changed = ledger.record_all(&records, minute(5)).unwrap();
    assert_eq!(changed.len(), 2);

    let sum_id = RecordId::new(&document, "sum");
    assert_eq!(ledger.history(&sum_id).unwrap()[0].exec_cost.big_o, "O(n)");
    assert!(store.current().iter().all(|r| r.timestamp.is_none()));
}
