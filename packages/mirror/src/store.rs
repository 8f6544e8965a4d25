//! # Live Store
//!
//! Holds the committed live tree and its revision.
//!
//! The store can be:
//! - **Memory-backed**: for tests and one-shot runs
//! - **File-backed**: persisted as a JSON snapshot next to a revision
//!   counter and the read context
//!
//! ## Commit
//!
//! ```text
//! check revision → check on-disk checksum → write temp file → rename → swap tree
//! ```
//!
//! A commit either replaces the whole tree or leaves it untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use folio_tree::{checksum, NodeSnapshot, Tree};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::outcome::ReadContext;

/// On-disk representation of the live tree
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    revision: u64,
    root: NodeSnapshot,
    #[serde(default, skip_serializing_if = "ReadContext::is_empty")]
    read_context: ReadContext,
}

/// Storage backend for the live tree
#[derive(Debug)]
enum StoreBackend {
    Memory,
    File {
        path: PathBuf,
        /// Checksum of the bytes last read or written (None before the
        /// first write)
        checksum: Option<u32>,
    },
}

#[derive(Debug)]
pub struct LiveStore {
    tree: Tree,
    revision: u64,
    read_context: ReadContext,
    backend: StoreBackend,
}

impl LiveStore {
    /// Empty memory-backed store
    pub fn in_memory() -> Self {
        Self::from_tree(Tree::new())
    }

    /// Memory-backed store seeded with `tree`
    pub fn from_tree(tree: Tree) -> Self {
        Self {
            tree,
            revision: 0,
            read_context: ReadContext::new(),
            backend: StoreBackend::Memory,
        }
    }

    /// Open a file-backed store; a missing file is an empty tree at revision 0
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "live store not found, starting empty");
            return Ok(Self {
                tree: Tree::new(),
                revision: 0,
                read_context: ReadContext::new(),
                backend: StoreBackend::File {
                    path,
                    checksum: None,
                },
            });
        }

        let bytes = fs::read(&path)?;
        let file: StoreFile = serde_json::from_slice(&bytes)?;
        let tree = Tree::from_snapshot(&file.root)?;
        tracing::debug!(
            path = %path.display(),
            revision = file.revision,
            nodes = tree.len(),
            "opened live store"
        );

        Ok(Self {
            tree,
            revision: file.revision,
            read_context: file.read_context,
            backend: StoreBackend::File {
                checksum: Some(checksum(&bytes)),
                path,
            },
        })
    }

    /// Committed live tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Committed workflow stages
    pub fn read_context(&self) -> &ReadContext {
        &self.read_context
    }

    /// Backing file, if any
    pub fn location(&self) -> Option<&Path> {
        match &self.backend {
            StoreBackend::Memory => None,
            StoreBackend::File { path, .. } => Some(path),
        }
    }

    /// Replace the committed tree and read context
    ///
    /// Fails without touching anything when the store moved past
    /// `base_revision` or when the backing file changed behind our back.
    pub fn commit(
        &mut self,
        base_revision: u64,
        tree: Tree,
        read_context: ReadContext,
    ) -> Result<u64, StoreError> {
        if base_revision != self.revision {
            return Err(StoreError::RevisionMismatch {
                expected: base_revision,
                found: self.revision,
            });
        }

        let revision = self.revision + 1;
        if let StoreBackend::File { path, checksum: last } = &mut self.backend {
            ensure_unchanged(path, *last)?;
            let written = write_atomic(path, revision, &tree, &read_context)?;
            *last = Some(written);
        }

        self.tree = tree;
        self.read_context = read_context;
        self.revision = revision;
        Ok(revision)
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn ensure_unchanged(path: &Path, expected: Option<u32>) -> Result<(), StoreError> {
    let current = match fs::read(path) {
        Ok(bytes) => Some(checksum(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    if current != expected {
        return Err(StoreError::ExternalModification(path.display().to_string()));
    }
    Ok(())
}

/// Write the snapshot to a sibling temp file and rename it into place
fn write_atomic(
    path: &Path,
    revision: u64,
    tree: &Tree,
    read_context: &ReadContext,
) -> Result<u32, StoreError> {
    let file = StoreFile {
        revision,
        root: tree.to_snapshot(),
        read_context: read_context.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&file)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    {
        let mut out = fs::File::create(&tmp)?;
        out.write_all(&bytes)?;
        out.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), revision, bytes = bytes.len(), "wrote live store");
    Ok(checksum(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::WorkflowStage;
    use folio_tree::{Identifier, NodePath};

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    fn tree_with(path: &str) -> Tree {
        let mut tree = Tree::new();
        tree.insert(&p(path), Some(Identifier::new("U0"))).unwrap();
        tree
    }

    #[test]
    fn test_memory_commit_bumps_revision() {
        let mut store = LiveStore::in_memory();
        assert_eq!(store.revision(), 0);

        let revision = store.commit(0, tree_with("/cmf"), ReadContext::new()).unwrap();

        assert_eq!(revision, 1);
        assert!(store.tree().contains(&p("/cmf")));
        assert!(store.location().is_none());
    }

    #[test]
    fn test_stale_revision_is_rejected() {
        let mut store = LiveStore::in_memory();
        store.commit(0, tree_with("/cmf"), ReadContext::new()).unwrap();

        let err = store.commit(0, tree_with("/other"), ReadContext::new()).unwrap_err();

        assert!(matches!(err, StoreError::RevisionMismatch { expected: 0, found: 1 }));
        assert!(store.tree().contains(&p("/cmf")));
        assert!(!store.tree().contains(&p("/other")));
    }

    #[test]
    fn test_file_store_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");

        let mut store = LiveStore::open(&path).unwrap();
        assert!(store.tree().is_empty());
        let mut context = ReadContext::new();
        context.insert(Identifier::new("U0"), WorkflowStage::Unpublished);
        store.commit(0, tree_with("/cmf"), context).unwrap();

        let reopened = LiveStore::open(&path).unwrap();
        assert_eq!(reopened.revision(), 1);
        assert_eq!(
            reopened.read_context().get(&Identifier::new("U0")),
            Some(&WorkflowStage::Unpublished)
        );
        assert_eq!(
            reopened.tree().find_by_identifier(&Identifier::new("U0")),
            reopened.tree().lookup(&p("/cmf"))
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_external_modification_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");

        let mut store = LiveStore::open(&path).unwrap();
        store.commit(0, tree_with("/cmf"), ReadContext::new()).unwrap();
        fs::write(&path, "{\"revision\": 7, \"root\": {}}").unwrap();

        let err = store.commit(1, tree_with("/other"), ReadContext::new()).unwrap_err();

        assert!(matches!(err, StoreError::ExternalModification(_)));
        assert_eq!(store.revision(), 1);
        assert!(store.tree().contains(&p("/cmf")));
    }
}
