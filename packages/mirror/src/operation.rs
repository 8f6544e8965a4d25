//! # Structural Operations
//!
//! Events emitted by the draft-tree mutation pipeline and consumed, in
//! emission order, by the mirror engine.
//!
//! ## Wire format
//!
//! Operations are internally tagged JSON objects:
//!
//! ```json
//! { "type": "create", "path": "/cmf/sulu", "isNew": true }
//! { "type": "move", "path": "/cmf/a", "destId": "U7", "destName": "a" }
//! { "type": "commit" }
//! ```
//!
//! A log is either a JSON array of operations or one operation per line.

use std::path::Path;

use folio_tree::{Identifier, NodePath};
use serde::{Deserialize, Serialize};

use crate::errors::{MirrorError, MirrorResult};

/// Capability of a document to report where it lives in the draft tree
pub trait PathBehavior {
    /// Current draft path
    fn path(&self) -> &NodePath;

    /// Draft path recorded before the latest rename or move
    fn prior_path(&self) -> &NodePath {
        self.path()
    }
}

/// Minimal document handle carried by operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: NodePath,
    pub prior_path: Option<NodePath>,
}

impl DocumentRef {
    pub fn new(path: NodePath) -> Self {
        Self {
            path,
            prior_path: None,
        }
    }

    pub fn renamed(prior_path: NodePath, path: NodePath) -> Self {
        Self {
            path,
            prior_path: Some(prior_path),
        }
    }
}

impl PathBehavior for DocumentRef {
    fn path(&self) -> &NodePath {
        &self.path
    }

    fn prior_path(&self) -> &NodePath {
        self.prior_path.as_ref().unwrap_or(&self.path)
    }
}

/// Structural or lifecycle event to mirror into the live tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    /// Mirror a new node, or rename an already mirrored one
    #[serde(rename_all = "camelCase")]
    Create {
        path: NodePath,
        is_new: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prior_path: Option<NodePath>,
    },

    /// Remove the live node and its subtree
    Remove { path: NodePath },

    /// Reparent/rename the live node found at its prior path
    #[serde(rename_all = "camelCase")]
    Move {
        path: NodePath,
        dest_id: Identifier,
        dest_name: String,
    },

    /// Mirror a freshly copied draft subtree
    Copy { path: NodePath },

    /// Place the node before the sibling `dest_id` (last when absent)
    #[serde(rename_all = "camelCase")]
    Reorder {
        path: NodePath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest_id: Option<Identifier>,
    },

    /// Bind the live node to the read context as published
    Publish { path: NodePath },

    /// Bind the live node to the read context as unpublished
    Unpublish { path: NodePath },

    /// Flush the pending live mutations as one unit
    Commit,
}

impl Operation {
    /// Document addressed by this operation (`None` for commit)
    pub fn document(&self) -> Option<DocumentRef> {
        match self {
            Operation::Create {
                path, prior_path, ..
            } => Some(DocumentRef {
                path: path.clone(),
                prior_path: prior_path.clone(),
            }),
            Operation::Remove { path }
            | Operation::Move { path, .. }
            | Operation::Copy { path }
            | Operation::Reorder { path, .. }
            | Operation::Publish { path }
            | Operation::Unpublish { path } => Some(DocumentRef::new(path.clone())),
            Operation::Commit => None,
        }
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Remove { .. } => "remove",
            Operation::Move { .. } => "move",
            Operation::Copy { .. } => "copy",
            Operation::Reorder { .. } => "reorder",
            Operation::Publish { .. } => "publish",
            Operation::Unpublish { .. } => "unpublish",
            Operation::Commit => "commit",
        }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Operation::Commit)
    }
}

/// Operation tagged with its emission sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub sequence: u64,
    pub operation: Operation,
}

/// Ordered set of operations, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationLog {
    entries: Vec<LogEntry>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation, returning its sequence number
    pub fn push(&mut self, operation: Operation) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        self.entries.push(LogEntry {
            sequence,
            operation,
        });
        sequence
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Split the log into publication units
    ///
    /// Each unit ends with (and includes) a commit. Trailing operations
    /// without a commit form a final, uncommitted unit.
    pub fn units(&self) -> Vec<&[LogEntry]> {
        let mut units = Vec::new();
        let mut start = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.operation.is_commit() {
                units.push(&self.entries[start..=index]);
                start = index + 1;
            }
        }
        if start < self.entries.len() {
            units.push(&self.entries[start..]);
        }
        units
    }

    /// Parse a JSON array or JSON-lines document
    pub fn parse(source: &str) -> MirrorResult<Self> {
        let trimmed = source.trim_start();
        let operations: Vec<Operation> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed).map_err(|e| MirrorError::OperationLog(e.to_string()))?
        } else {
            let mut operations = Vec::new();
            for (line_no, line) in source.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let operation = serde_json::from_str(line).map_err(|e| {
                    MirrorError::OperationLog(format!("line {}: {}", line_no + 1, e))
                })?;
                operations.push(operation);
            }
            operations
        };

        Ok(operations.into_iter().collect())
    }

    pub fn load(path: &Path) -> MirrorResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| MirrorError::OperationLog(format!("{}: {}", path.display(), e)))?;
        Self::parse(&source)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let operations: Vec<&Operation> = self.entries.iter().map(|e| &e.operation).collect();
        serde_json::to_string_pretty(&operations)
    }
}

impl FromIterator<Operation> for OperationLog {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut log = OperationLog::new();
        for operation in iter {
            log.push(operation);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn test_operation_wire_format() {
        let op = Operation::Move {
            path: p("/cmf/a"),
            dest_id: Identifier::new("U7"),
            dest_name: "b".to_string(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "move", "path": "/cmf/a", "destId": "U7", "destName": "b" })
        );

        let commit: Operation = serde_json::from_str(r#"{ "type": "commit" }"#).unwrap();
        assert_eq!(commit, Operation::Commit);

        let create: Operation =
            serde_json::from_str(r#"{ "type": "create", "path": "/cmf-test", "isNew": false, "priorPath": "/cmf" }"#)
                .unwrap();
        assert_eq!(
            create.document(),
            Some(DocumentRef::renamed(p("/cmf"), p("/cmf-test")))
        );
    }

    #[test]
    fn test_prior_path_defaults_to_current_path() {
        let doc = DocumentRef::new(p("/cmf/sulu"));
        assert_eq!(doc.prior_path(), &p("/cmf/sulu"));

        let renamed = DocumentRef::renamed(p("/cmf"), p("/cmf-test"));
        assert_eq!(renamed.prior_path(), &p("/cmf"));
        assert_eq!(renamed.path(), &p("/cmf-test"));
    }

    #[test]
    fn test_parse_json_lines_with_comments() {
        let source = r#"
            # first unit
            { "type": "create", "path": "/cmf", "isNew": true }
            { "type": "commit" }

            { "type": "reorder", "path": "/cmf" }
        "#;

        let log = OperationLog::parse(source).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[2].sequence, 3);
        assert_eq!(
            log.entries()[2].operation,
            Operation::Reorder { path: p("/cmf"), dest_id: None }
        );
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let source = "{ \"type\": \"commit\" }\n{ \"type\": \"explode\" }\n";
        let err = OperationLog::parse(source).unwrap_err();
        assert!(err.to_string().contains("line 2"), "unexpected error: {}", err);
    }

    #[test]
    fn test_units_split_on_commit() {
        let log: OperationLog = vec![
            Operation::Publish { path: p("/a") },
            Operation::Commit,
            Operation::Publish { path: p("/b") },
            Operation::Unpublish { path: p("/c") },
            Operation::Commit,
            Operation::Remove { path: p("/d") },
        ]
        .into_iter()
        .collect();

        let units = log.units();
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].len(), 2);
        assert_eq!(units[1].len(), 3);
        assert_eq!(units[2].len(), 1);
        assert!(!units[2][0].operation.is_commit());
    }

    #[test]
    fn test_json_array_round_trip() {
        let source = r#"[{ "type": "copy", "path": "/cmf/a" }, { "type": "commit" }]"#;
        let log = OperationLog::parse(source).unwrap();
        let reparsed = OperationLog::parse(&log.to_json().unwrap()).unwrap();
        assert_eq!(log, reparsed);
    }
}
