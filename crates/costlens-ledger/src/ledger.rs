//! # Cost Ledger - Main Facade
//!
//! Coordinates the in-memory [`HistoryLedger`] and [`Whitelist`] with their
//! sled-backed [`Storage`], so that every mutation is written through and a
//! restarted session sees the same histories and exemptions.
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │    CostLedger    │
//!                 │     (Facade)     │
//!                 └────────┬─────────┘
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │   History   │ │  Whitelist  │ │   Storage   │
//!   │   Ledger    │ │             │ │   (Sled)    │
//!   └─────────────┘ └─────────────┘ └─────────────┘
//! ```

use crate::history::{History, HistoryLedger};
use crate::models::{CostRecord, RecordId, Result};
use crate::storage::Storage;
use crate::whitelist::{self, Whitelist};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{debug, info};

/// Persistent history ledger and whitelist.
///
/// # Example
///
/// ```rust
/// use costlens_ledger::CostLedger;
///
/// let mut ledger = CostLedger::temporary(Some(10)).unwrap();
/// ledger.add_to_whitelist("toString").unwrap();
/// assert!(ledger.is_whitelisted("toString"));
/// ```
pub struct CostLedger {
    storage: Storage,
    history: HistoryLedger,
    whitelist: Whitelist,
}

impl CostLedger {
    /// Opens the ledger database at `path` and loads its contents.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Database` if the database cannot be opened and
    /// `LedgerError::Serialization` if a stored history is corrupt.
    pub fn new<P: AsRef<Path>>(path: P, history_limit: Option<usize>) -> Result<Self> {
        let storage = Storage::open(path)?;
        let mut history = HistoryLedger::new(history_limit);
        for (id, entries) in storage.load_histories()? {
            history.restore(id, entries);
        }
        let whitelist = storage.load_whitelist()?;

        info!(
            "Cost ledger loaded: {} histories, {} whitelisted names",
            history.len(),
            whitelist.len()
        );

        Ok(Self {
            storage,
            history,
            whitelist,
        })
    }

    /// Creates an in-memory ledger discarded on drop.
    pub fn temporary(history_limit: Option<usize>) -> Result<Self> {
        Ok(Self {
            storage: Storage::temporary()?,
            history: HistoryLedger::new(history_limit),
            whitelist: Whitelist::new(),
        })
    }

    /// Records a fresh analysis pass and writes changed histories through.
    ///
    /// Returns the ids whose history changed.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Database` or `LedgerError::Serialization` if the
    /// write fails; the in-memory histories are then unchanged.
    pub fn record_all(&mut self, items: &[CostRecord], at: DateTime<Local>) -> Result<Vec<RecordId>> {
        let staged = self.history.stage(items, at);
        self.storage.store_histories(&staged)?;
        let changed = self.history.commit(staged);

        debug!("Recorded {} items, {} histories changed", items.len(), changed.len());
        Ok(changed)
    }

    /// History of `id`, most recent first.
    pub fn history(&self, id: &RecordId) -> Option<&History> {
        self.history.history(id)
    }

    /// Number of methods with a history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Adds a name to the whitelist and persists it.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidName` for empty names (nothing is stored).
    pub fn add_to_whitelist(&mut self, name: &str) -> Result<bool> {
        let name = whitelist::validate(name)?;
        let added = self.whitelist.add(name)?;
        if added {
            self.storage.insert_whitelisted(name)?;
            info!("Whitelisted method name: {}", name);
        }
        Ok(added)
    }

    /// Removes a name from the whitelist and persists the removal.
    pub fn remove_from_whitelist(&mut self, name: &str) -> Result<bool> {
        let name = whitelist::validate(name)?;
        let removed = self.whitelist.remove(name)?;
        if removed {
            self.storage.remove_whitelisted(name)?;
            info!("Removed method name from whitelist: {}", name);
        }
        Ok(removed)
    }

    /// Returns true if `name` is whitelisted.
    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.contains(name)
    }

    /// The current whitelist.
    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<usize> {
        self.storage.flush()
    }
}

impl std::fmt::Debug for CostLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostLedger")
            .field("histories", &self.history.len())
            .field("whitelist", &self.whitelist)
            .finish()
    }
}
