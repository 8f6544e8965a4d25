//! # Publication Gate
//!
//! Owns the live store and the read context.
//!
//! ## Responsibilities
//!
//! - Hand out one [`PublicationSession`] per publication unit
//! - Bind live nodes to a workflow stage (publish / unpublish)
//! - Commit a session as one atomic unit or discard it
//! - Answer which tree a read for a document should target
//!
//! ## Lifecycle
//!
//! ```text
//! begin → mirror ops → publish/unpublish → commit
//!   ↓                                         ↓
//! staged copy of live            store revision + read context
//! ```

use folio_tree::{NodePath, Tree, UnitIdGenerator};

use crate::errors::{MirrorError, MirrorResult};
use crate::history::{CommitHistory, CommitReceipt};
use crate::operation::PathBehavior;
use crate::outcome::{LiveNodeRef, MirrorOutcome, ReadContext, ReadTarget, WorkflowStage};
use crate::resolver::PathResolver;
use crate::session::{LiveChange, PublicationSession};
use crate::store::LiveStore;

#[derive(Debug)]
pub struct PublicationGate {
    store: LiveStore,
    resolver: PathResolver,
    history: CommitHistory,
    unit_ids: UnitIdGenerator,
}

impl PublicationGate {
    pub fn new(store: LiveStore, resolver: PathResolver) -> Self {
        let location = store
            .location()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "memory".to_string());

        Self {
            store,
            resolver,
            history: CommitHistory::new(),
            unit_ids: UnitIdGenerator::new(&location),
        }
    }

    /// Keep at most `max_levels` commit receipts (0 = unlimited)
    pub fn with_history_limit(mut self, max_levels: usize) -> Self {
        self.history = CommitHistory::with_max_levels(max_levels);
        self
    }

    /// Committed live tree
    pub fn live(&self) -> &Tree {
        self.store.tree()
    }

    pub fn store(&self) -> &LiveStore {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn history(&self) -> &CommitHistory {
        &self.history
    }

    /// Start a publication unit from the committed live tree
    pub fn begin(&mut self) -> PublicationSession {
        let id = self.unit_ids.new_id();
        tracing::debug!(unit = %id, revision = self.store.revision(), "began publication unit");
        PublicationSession::new(id, self.store.revision(), self.store.tree().clone())
    }

    /// Bind the live counterpart of `document` as published
    pub fn publish(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
    ) -> MirrorResult<MirrorOutcome> {
        self.bind(session, document, WorkflowStage::Published)
    }

    /// Bind the live counterpart of `document` as unpublished
    ///
    /// The live node itself stays in place.
    pub fn unpublish(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
    ) -> MirrorResult<MirrorOutcome> {
        self.bind(session, document, WorkflowStage::Unpublished)
    }

    fn bind(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
        stage: WorkflowStage,
    ) -> MirrorResult<MirrorOutcome> {
        let live_path = self.resolver.to_live(document.path())?;
        let tree = session.tree();
        let Some(node) = tree.get(&live_path) else {
            tracing::warn!(path = %live_path, ?stage, "bind target was never published");
            return Ok(MirrorOutcome::NeverPublished { path: live_path });
        };
        let identifier = node.identifier().cloned().ok_or_else(|| {
            MirrorError::violation("bind", format!("live node {} carries no identifier", live_path))
        })?;
        let order = node.order();

        session.bind(identifier.clone(), stage);
        session.record(LiveChange::Bound {
            path: live_path.clone(),
            stage,
        });
        Ok(MirrorOutcome::Bound(LiveNodeRef {
            path: live_path,
            identifier,
            order,
            stage,
        }))
    }

    /// Make every staged change of `session` visible at once
    ///
    /// On failure nothing is applied and the session is gone; the caller
    /// may replay the unit against a fresh session.
    pub fn commit(&mut self, session: PublicationSession) -> MirrorResult<CommitReceipt> {
        let parts = session.into_parts();

        let revision = if parts.pending.is_empty() {
            self.store.revision()
        } else {
            let mut read_context: ReadContext = self.store.read_context().clone();
            for identifier in &parts.released {
                read_context.remove(identifier);
            }
            read_context.extend(parts.bindings);

            self.store
                .commit(parts.base_revision, parts.staged, read_context)
                .map_err(|source| {
                    tracing::warn!(unit = %parts.id, error = %source, "commit failed, unit discarded");
                    MirrorError::CommitFailure {
                        unit: parts.id.clone(),
                        source,
                    }
                })?
        };

        let receipt = CommitReceipt::new(parts.id, revision, parts.pending);
        tracing::info!(
            unit = %receipt.unit_id,
            revision,
            changes = receipt.change_count(),
            "committed publication unit"
        );
        self.history.push(receipt.clone());
        Ok(receipt)
    }

    /// Drop a session without touching the live tree
    pub fn discard(&self, session: PublicationSession) {
        if !session.is_empty() {
            tracing::warn!(
                unit = %session.id(),
                pending = session.pending_count(),
                "discarded publication unit"
            );
        }
    }

    /// Committed live counterpart of a draft document
    ///
    /// Returns `None` for paths outside the mirrored root and for documents
    /// that were never published.
    pub fn resolve(&self, document_path: &NodePath) -> Option<LiveNodeRef> {
        let live_path = self.resolver.to_live(document_path).ok()?;
        let node = self.store.tree().get(&live_path)?;
        let identifier = node.identifier()?.clone();
        let stage = self
            .store
            .read_context()
            .get(&identifier)
            .copied()
            .unwrap_or(WorkflowStage::Published);

        Some(LiveNodeRef {
            path: live_path,
            order: node.order(),
            identifier,
            stage,
        })
    }

    /// Tree a read for `document_path` should target
    pub fn read_target(&self, document_path: &NodePath) -> ReadTarget {
        match self.resolve(document_path) {
            Some(node) if node.stage == WorkflowStage::Published => ReadTarget::Live(node),
            _ => ReadTarget::Draft,
        }
    }
}

impl Default for PublicationGate {
    fn default() -> Self {
        Self::new(LiveStore::in_memory(), PathResolver::identity())
    }
}
