//! # Commit History
//!
//! Bounded record of committed publication units.
//!
//! ## Design
//!
//! - Every successful commit pushes one receipt
//! - Receipts carry the store revision they produced
//! - Oldest receipts are dropped once `max_levels` is exceeded
//! - Failed or discarded units never reach the history

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::PendingChange;

/// Summary of one committed publication unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    /// Unit id assigned by the gate
    pub unit_id: String,

    /// Store revision after the commit
    pub revision: u64,

    /// Changes made visible by this commit (in application order)
    pub changes: Vec<PendingChange>,

    pub committed_at: DateTime<Utc>,
}

impl CommitReceipt {
    pub fn new(unit_id: impl Into<String>, revision: u64, changes: Vec<PendingChange>) -> Self {
        Self {
            unit_id: unit_id.into(),
            revision,
            changes,
            committed_at: Utc::now(),
        }
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }
}

#[derive(Debug)]
pub struct CommitHistory {
    /// Committed units (most recent last)
    receipts: Vec<CommitReceipt>,

    /// Maximum number of receipts kept (0 = unlimited)
    max_levels: usize,
}

impl CommitHistory {
    /// Create a history keeping the default 50 receipts
    pub fn new() -> Self {
        Self::with_max_levels(50)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            receipts: Vec::new(),
            max_levels,
        }
    }

    pub fn push(&mut self, receipt: CommitReceipt) {
        self.receipts.push(receipt);

        if self.max_levels > 0 && self.receipts.len() > self.max_levels {
            self.receipts.remove(0);
        }
    }

    /// Most recent receipt
    pub fn last(&self) -> Option<&CommitReceipt> {
        self.receipts.last()
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Receipts, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &CommitReceipt> {
        self.receipts.iter()
    }

    pub fn clear(&mut self) {
        self.receipts.clear();
    }
}

impl Default for CommitHistory {
    fn default() -> Self {
        Self::new()
    }
}
