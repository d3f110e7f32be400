//! Whitelist of method names exempt from change-significance checks.
//!
//! Entries are raw method names: overloads sharing a name are
//! indistinguishable here.

use crate::models::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of whitelisted method names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist {
    names: BTreeSet<String>,
}

impl Whitelist {
    /// Creates an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` after trimming. Returns false if it was already present.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidName` if the trimmed name is empty; the
    /// whitelist is left unchanged.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        let name = validate(name)?;
        Ok(self.names.insert(name.to_string()))
    }

    /// Removes `name` after trimming. Returns false if it was not present.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidName` if the trimmed name is empty.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let name = validate(name)?;
        Ok(self.names.remove(name))
    }

    /// Returns true if `name` (trimmed) is whitelisted.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name.trim())
    }

    /// Whitelisted names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is whitelisted.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Whitelist {
    /// Collects names, silently skipping empty ones.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut whitelist = Whitelist::new();
        for name in iter {
            let _ = whitelist.add(name.as_ref());
        }
        whitelist
    }
}

pub(crate) fn validate(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}
