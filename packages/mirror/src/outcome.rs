use std::collections::BTreeMap;

use folio_tree::{Identifier, NodePath};
use serde::{Deserialize, Serialize};

use crate::history::CommitReceipt;

/// Workflow stage a live node is bound to in the read context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStage {
    Published,
    Unpublished,
}

/// Committed workflow stage per live identifier
pub type ReadContext = BTreeMap<Identifier, WorkflowStage>;

/// Reference to a committed or staged live node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveNodeRef {
    pub path: NodePath,
    pub identifier: Identifier,
    pub order: Option<i64>,
    pub stage: WorkflowStage,
}

/// Tree a read for a document should target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadTarget {
    Live(LiveNodeRef),
    Draft,
}

/// Result of applying one operation
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorOutcome {
    /// `count` live nodes were created under `path`
    Created { path: NodePath, count: usize },

    Renamed { from: NodePath, to: NodePath },

    Moved { from: NodePath, to: NodePath },

    /// `path` and its subtree (`count` nodes) were removed
    Removed { path: NodePath, count: usize },

    /// Siblings of `path` were reordered and renumbered
    Reordered { path: NodePath, siblings: usize },

    Bound(LiveNodeRef),

    /// Target already exists in live, nothing was written
    AlreadyMirrored { path: NodePath },

    /// Live node already matches the draft
    Unchanged { path: NodePath },

    /// Target is absent from live
    NeverPublished { path: NodePath },

    Committed(CommitReceipt),
}

impl MirrorOutcome {
    /// True when the operation left the live tree untouched
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            MirrorOutcome::AlreadyMirrored { .. }
                | MirrorOutcome::Unchanged { .. }
                | MirrorOutcome::NeverPublished { .. }
        )
    }

    pub fn is_never_published(&self) -> bool {
        matches!(self, MirrorOutcome::NeverPublished { .. })
    }

    /// Short label used by reports
    pub fn label(&self) -> &'static str {
        match self {
            MirrorOutcome::Created { .. } => "created",
            MirrorOutcome::Renamed { .. } => "renamed",
            MirrorOutcome::Moved { .. } => "moved",
            MirrorOutcome::Removed { .. } => "removed",
            MirrorOutcome::Reordered { .. } => "reordered",
            MirrorOutcome::Bound(_) => "bound",
            MirrorOutcome::AlreadyMirrored { .. } => "already mirrored",
            MirrorOutcome::Unchanged { .. } => "unchanged",
            MirrorOutcome::NeverPublished { .. } => "never published",
            MirrorOutcome::Committed(_) => "committed",
        }
    }
}
