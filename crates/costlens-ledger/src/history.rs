//! # History Ledger
//!
//! Per-method history of cost estimates, most recent first.
//!
//! ## Update Rule
//!
//! For every record of a fresh analysis pass:
//!
//! 1. Look up the history by record id (absent = empty).
//! 2. If the head carries the same execution polynomial, skip.
//! 3. Otherwise stamp a copy with the capture time and prepend it.
//!
//! Consecutive identical estimates therefore never accumulate. Histories of
//! methods that disappear (renamed, removed, inlined) are kept as they are.
//!
//! Overloads share a record id. Only the first record of an id in a pass
//! (the lowest line) is considered, so an unchanged class with overloads of
//! different costs does not grow its history on every run.
//!
//! ## Two-Phase Updates
//!
//! [`HistoryLedger::stage`] computes the histories a pass would change
//! without touching the ledger; [`HistoryLedger::commit`] installs them.
//! Callers persist between the two, so a failed write leaves memory as it was.
//!
//! ## Retention
//!
//! Each history is capped at `limit` entries when a limit is configured; the
//! oldest entries are dropped first.

use crate::models::{CostRecord, RecordId};
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Default number of entries kept per method id.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Ordered history of one method, most recent first.
pub type History = VecDeque<CostRecord>;

/// Updated histories produced by [`HistoryLedger::stage`].
pub type StagedHistories = Vec<(RecordId, History)>;

/// Formats a capture time as local, 24-hour, human-readable text
/// (`10/19/2026, 14:03:22`).
pub fn capture_timestamp(at: DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y, %H:%M:%S").to_string()
}

/// In-memory history ledger.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    histories: HashMap<RecordId, History>,
    limit: Option<usize>,
}

impl HistoryLedger {
    /// Creates an empty ledger. `None` keeps histories unbounded.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            histories: HashMap::new(),
            limit: limit.map(|limit| limit.max(1)),
        }
    }

    /// Computes the histories changed by a fresh analysis pass, all stamped
    /// with the same capture time. The ledger itself is not modified.
    pub fn stage(&self, items: &[CostRecord], at: DateTime<Local>) -> StagedHistories {
        let timestamp = capture_timestamp(at);
        let mut seen = HashSet::new();
        let mut staged = Vec::new();

        for item in items {
            if !seen.insert(&item.id) {
                debug!("Skipping later overload of {}", item.id);
                continue;
            }

            let current = self.histories.get(&item.id);
            if current
                .and_then(VecDeque::front)
                .is_some_and(|head| head.same_exec_cost(item))
            {
                debug!("Unchanged cost for {}, history not updated", item.id);
                continue;
            }

            let mut history = current.cloned().unwrap_or_default();
            history.push_front(item.stamped(timestamp.as_str()));
            if let Some(limit) = self.limit {
                history.truncate(limit);
            }
            staged.push((item.id.clone(), history));
        }

        staged
    }

    /// Installs staged histories. Returns the ids that changed.
    pub fn commit(&mut self, staged: StagedHistories) -> Vec<RecordId> {
        staged
            .into_iter()
            .map(|(id, history)| {
                self.histories.insert(id.clone(), history);
                id
            })
            .collect()
    }

    /// Installs a history loaded from storage, applying the retention cap.
    pub fn restore(&mut self, id: RecordId, mut history: History) {
        if let Some(limit) = self.limit {
            history.truncate(limit);
        }
        self.histories.insert(id, history);
    }

    /// History of `id`, most recent first.
    pub fn history(&self, id: &RecordId) -> Option<&History> {
        self.histories.get(id)
    }

    /// Number of methods with a history.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Returns true if no history exists.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}
