//! # Publication Session
//!
//! Transactional handle for one publication unit.
//!
//! A session starts from a private copy of the committed live tree. Every
//! mirror operation mutates that staged copy and records a pending change;
//! nothing is visible to readers until the gate commits the session. A
//! discarded session leaves the committed tree untouched.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use folio_tree::{Identifier, NodePath, Tree};
use serde::Serialize;

use crate::outcome::WorkflowStage;

/// One staged live-tree change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LiveChange {
    Created { path: NodePath, identifier: Identifier },
    Renamed { from: NodePath, to: NodePath },
    Moved { from: NodePath, to: NodePath },
    Removed { path: NodePath, count: usize },
    Reordered { path: NodePath, siblings: usize },
    Bound { path: NodePath, stage: WorkflowStage },
}

/// Change waiting for commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChange {
    pub sequence: usize,
    pub change: LiveChange,
    pub timestamp: DateTime<Utc>,
}

/// Everything a commit needs from a finished session
#[derive(Debug)]
pub(crate) struct SessionParts {
    pub id: String,
    pub base_revision: u64,
    pub staged: Tree,
    pub pending: Vec<PendingChange>,
    pub bindings: HashMap<Identifier, WorkflowStage>,
    pub released: HashSet<Identifier>,
}

/// Staged live mutations of one publication unit
#[derive(Debug)]
pub struct PublicationSession {
    id: String,
    base_revision: u64,
    staged: Tree,
    pending: Vec<PendingChange>,
    bindings: HashMap<Identifier, WorkflowStage>,
    released: HashSet<Identifier>,
}

impl PublicationSession {
    pub(crate) fn new(id: String, base_revision: u64, staged: Tree) -> Self {
        Self {
            id,
            base_revision,
            staged,
            pending: Vec::new(),
            bindings: HashMap::new(),
            released: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store revision this session was started from
    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }

    /// Staged live tree, including uncommitted changes
    pub fn tree(&self) -> &Tree {
        &self.staged
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Tree {
        &mut self.staged
    }

    pub(crate) fn record(&mut self, change: LiveChange) {
        tracing::debug!(unit = %self.id, change = ?change, "staged live change");
        self.pending.push(PendingChange {
            sequence: self.pending.len() + 1,
            change,
            timestamp: Utc::now(),
        });
    }

    /// Stage a read-context binding for a live node
    pub(crate) fn bind(&mut self, identifier: Identifier, stage: WorkflowStage) {
        self.released.remove(&identifier);
        self.bindings.insert(identifier, stage);
    }

    /// Drop read-context bindings of removed nodes on commit
    pub(crate) fn release(&mut self, identifiers: impl IntoIterator<Item = Identifier>) {
        for identifier in identifiers {
            self.bindings.remove(&identifier);
            self.released.insert(identifier);
        }
    }

    /// Stage bound to `identifier` within this session, if any
    pub fn binding(&self, identifier: &Identifier) -> Option<WorkflowStage> {
        self.bindings.get(identifier).copied()
    }

    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn into_parts(self) -> SessionParts {
        SessionParts {
            id: self.id,
            base_revision: self.base_revision,
            staged: self.staged,
            pending: self.pending,
            bindings: self.bindings,
            released: self.released,
        }
    }
}
