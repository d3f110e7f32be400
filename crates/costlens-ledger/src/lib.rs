//! # Costlens Ledger - Cost Records and History
//!
//! The ledger owns everything costlens knows about method costs: the
//! normalized records produced by each analysis pass, the per-document store
//! the editor renders from, the per-method history of estimates over time,
//! and the whitelist of methods whose edits never trigger re-analysis.
//!
//! ## Components
//!
//! | Component | Module | Persistence |
//! |-----------|--------|-------------|
//! | Report decoder | [`report`] | - |
//! | Cost Record Store | [`store`] | In memory |
//! | History Ledger | [`history`] | Sled (`history` tree) |
//! | Whitelist | [`whitelist`] | Sled (`whitelist` tree) |
//! | Facade | [`CostLedger`] | Writes through to sled |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         COST LEDGER                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  costs-report.json                                              │
//! │        │                                                        │
//! │        ▼                                                        │
//! │  ┌─────────────┐   records   ┌─────────────┐                    │
//! │  │   Report    │────────────▶│  CostStore  │──▶ decorations     │
//! │  │   Decoder   │             └─────────────┘                    │
//! │  └─────────────┘                    │                           │
//! │                                     ▼                           │
//! │                              ┌─────────────┐   ┌────────────┐   │
//! │                              │   History   │──▶│   Sled     │   │
//! │                              │   Ledger    │   │  Storage   │   │
//! │                              └─────────────┘   └────────────┘   │
//! │                                                       ▲         │
//! │                              ┌─────────────┐          │         │
//! │                              │  Whitelist  │──────────┘         │
//! │                              └─────────────┘                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use costlens_ledger::{report, CostLedger, CostStore, DocumentId};
//! use chrono::Local;
//!
//! let json = br#"[{
//!     "procedure_name": "sum",
//!     "loc": {"file": "Calc.java", "lnum": 7},
//!     "alloc_cost": {"hum": {"hum_polynomial": "0", "hum_degree": "0", "big_o": "O(1)"}},
//!     "exec_cost": {"hum": {"hum_polynomial": "5 + 3 * n", "hum_degree": "1", "big_o": "O(n)"}}
//! }]"#;
//!
//! let document = DocumentId::new("/work/Calc.java");
//! let records = report::parse_report(json, |_| document.clone()).unwrap();
//!
//! let mut ledger = CostLedger::temporary(Some(50)).unwrap();
//! let changed = ledger.record_all(&records, Local::now()).unwrap();
//! assert_eq!(changed.len(), 1);
//!
//! let mut store = CostStore::new();
//! let list = store.set_costs(document.clone(), records);
//! store.set_current(list);
//! assert_eq!(store.current()[0].method_name, "sum");
//! ```

pub mod history;
pub mod ledger;
pub mod models;
pub mod report;
pub mod storage;
pub mod store;
pub mod whitelist;

pub use history::{
    capture_timestamp, History, HistoryLedger, StagedHistories, DEFAULT_HISTORY_LIMIT,
};
pub use ledger::CostLedger;
pub use models::{
    Cost, CostRecord, DocumentId, LedgerError, Location, RecordId, Result, CONSTRUCTOR_NAME,
    STATIC_INITIALIZER_NAME,
};
pub use store::{CostStore, RecordList};
pub use whitelist::Whitelist;

#[cfg(test)]
mod tests;
