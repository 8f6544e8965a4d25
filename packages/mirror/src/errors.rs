//! Error types for the mirror engine
//!
//! Only fatal conditions live here. "Already mirrored" and "never
//! published" are ordinary outcomes, see [`crate::MirrorOutcome`].

use folio_tree::{PathError, TreeError};
use thiserror::Error;

pub type MirrorResult<T> = Result<T, MirrorError>;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("{path} is outside the mirrored root {root}")]
    OutsideRoot { path: String, root: String },

    #[error("Structural invariant violated during {operation}: {reason}")]
    StructuralInvariantViolation {
        operation: &'static str,
        reason: String,
    },

    #[error("Commit of unit {unit} failed: {source}")]
    CommitFailure {
        unit: String,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid operation log: {0}")]
    OperationLog(String),

    #[error("Publication unit {unit} aborted at operation #{sequence}: {source}")]
    UnitAborted {
        unit: usize,
        sequence: u64,
        #[source]
        source: Box<MirrorError>,
    },
}

impl MirrorError {
    pub fn violation(operation: &'static str, reason: impl ToString) -> Self {
        Self::StructuralInvariantViolation {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn outside_root(path: impl ToString, root: impl ToString) -> Self {
        Self::OutsideRoot {
            path: path.to_string(),
            root: root.to_string(),
        }
    }

    /// Whether the caller may retry the whole unit unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            MirrorError::CommitFailure { .. } => true,
            MirrorError::UnitAborted { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Errors raised by the live store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Concurrent modification: session based on revision {expected}, store is at {found}")]
    RevisionMismatch { expected: u64, found: u64 },

    #[error("Live store {0} was modified outside this engine")]
    ExternalModification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] TreeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_commit_failures_are_retryable() {
        let commit = MirrorError::CommitFailure {
            unit: "u-1".to_string(),
            source: StoreError::RevisionMismatch { expected: 1, found: 2 },
        };
        assert!(commit.is_retryable());

        let aborted = MirrorError::UnitAborted {
            unit: 0,
            sequence: 3,
            source: Box::new(commit),
        };
        assert!(aborted.is_retryable());

        assert!(!MirrorError::violation("move", "destination missing").is_retryable());
    }

    #[test]
    fn test_violation_message() {
        let err = MirrorError::violation("create", "live parent /cmf is not mirrored");
        assert_eq!(
            err.to_string(),
            "Structural invariant violated during create: live parent /cmf is not mirrored"
        );
    }
}
