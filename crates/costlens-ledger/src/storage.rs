//! # Persistent Storage Layer
//!
//! Sled-backed persistence for the parts of the ledger that outlive an editor
//! session: per-method cost histories and the whitelist.
//!
//! ## Storage Structure
//!
//! | Tree | Key | Value | Purpose |
//! |------|-----|-------|---------|
//! | `history` | record id | JSON array of records, most recent first | Cost history |
//! | `whitelist` | method name | empty | Exempt method names |
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use crate::history::History;
use crate::models::{LedgerError, RecordId, Result};
use crate::whitelist::Whitelist;
use std::path::Path;

/// Tree name for per-method histories.
const HISTORY_TREE: &str = "history";

/// Tree name for whitelisted method names.
const WHITELIST_TREE: &str = "whitelist";

/// Wrapper around a Sled database for ledger storage.
///
/// # Example
///
/// ```rust
/// use costlens_ledger::storage::Storage;
///
/// let storage = Storage::temporary().unwrap();
/// storage.insert_whitelisted("toString").unwrap();
/// assert!(storage.load_whitelist().unwrap().contains("toString"));
/// ```
#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
    history: sled::Tree,
    whitelist: sled::Tree,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Database` if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Creates a temporary storage that is discarded on drop.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let history = db.open_tree(HISTORY_TREE)?;
        let whitelist = db.open_tree(WHITELIST_TREE)?;
        Ok(Storage {
            db,
            history,
            whitelist,
        })
    }

    /// Stores the given histories in one atomic batch, replacing previous
    /// values. Nothing is written if any history fails to serialize.
    pub fn store_histories(&self, histories: &[(RecordId, History)]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for (id, history) in histories {
            batch.insert(id.as_str().as_bytes(), serde_json::to_vec(history)?);
        }
        self.history.apply_batch(batch)?;
        Ok(())
    }

    /// Loads every stored history in key order.
    pub fn load_histories(&self) -> Result<Vec<(RecordId, History)>> {
        let mut histories = Vec::new();

        for entry in self.history.iter() {
            let (key, value) = entry?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| LedgerError::CorruptEntry("history key is not UTF-8".to_string()))?;
            histories.push((RecordId::from_key(key), serde_json::from_slice(&value)?));
        }

        Ok(histories)
    }

    /// Adds a whitelisted name. Returns false if it was already stored.
    pub fn insert_whitelisted(&self, name: &str) -> Result<bool> {
        Ok(self.whitelist.insert(name.as_bytes(), Vec::<u8>::new())?.is_none())
    }

    /// Removes a whitelisted name. Returns false if it was not stored.
    pub fn remove_whitelisted(&self, name: &str) -> Result<bool> {
        Ok(self.whitelist.remove(name.as_bytes())?.is_some())
    }

    /// Loads the stored whitelist.
    pub fn load_whitelist(&self) -> Result<Whitelist> {
        let mut names = Vec::new();
        for entry in self.whitelist.iter() {
            let (key, _) = entry?;
            let name = String::from_utf8(key.to_vec())
                .map_err(|_| LedgerError::CorruptEntry("whitelist key is not UTF-8".to_string()))?;
            names.push(name);
        }
        Ok(names.into_iter().collect())
    }

    /// Flushes all pending writes to disk.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("histories", &self.history.len())
            .field("whitelisted", &self.whitelist.len())
            .finish()
    }
}
