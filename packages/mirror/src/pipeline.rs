//! # Publication Pipeline
//!
//! Drives operations through the mirror: Operation → Session → Commit
//!
//! The Pipeline manages:
//! - Opening a session for the current publication unit
//! - Dispatching each operation to the mirror, sequencer or gate
//! - Discarding the unit on the first fatal error
//! - Committing at every `Commit` operation

use folio_tree::Tree;

use crate::config::MirrorConfig;
use crate::errors::{MirrorError, MirrorResult};
use crate::gate::PublicationGate;
use crate::history::CommitReceipt;
use crate::mirror::TreeMirror;
use crate::operation::{Operation, OperationLog};
use crate::outcome::MirrorOutcome;
use crate::sequencer::OrderSequencer;
use crate::session::PublicationSession;
use crate::store::LiveStore;

pub struct Pipeline {
    gate: PublicationGate,
    mirror: TreeMirror,
    sequencer: OrderSequencer,
    session: Option<PublicationSession>,
}

impl Pipeline {
    pub fn new(gate: PublicationGate, mirror: TreeMirror, sequencer: OrderSequencer) -> Self {
        Self {
            gate,
            mirror,
            sequencer,
            session: None,
        }
    }

    /// Wire every component from one validated config
    pub fn from_config(config: &MirrorConfig, store: LiveStore) -> MirrorResult<Self> {
        config.validate()?;
        let gate = PublicationGate::new(store, config.resolver()).with_history_limit(config.history_limit);
        let mirror = TreeMirror::new(config.resolver(), config.sequencer()).with_mapper(config.mapper());
        Ok(Self::new(gate, mirror, config.sequencer()))
    }

    pub fn gate(&self) -> &PublicationGate {
        &self.gate
    }

    /// Session of the unit in progress, if any operation was applied since
    /// the last commit
    pub fn session(&self) -> Option<&PublicationSession> {
        self.session.as_ref()
    }

    pub fn into_gate(self) -> PublicationGate {
        self.gate
    }

    /// Apply one operation against `draft`
    ///
    /// A fatal error discards the whole unit in progress.
    pub fn apply(&mut self, draft: &Tree, operation: &Operation) -> MirrorResult<MirrorOutcome> {
        let result = match operation {
            Operation::Commit => self.commit().map(MirrorOutcome::Committed),
            _ => self.dispatch(draft, operation),
        };

        if let Err(err) = &result {
            tracing::error!(operation = operation.name(), error = %err, "fatal error, discarding unit");
            self.discard();
        }
        result
    }

    fn dispatch(&mut self, draft: &Tree, operation: &Operation) -> MirrorResult<MirrorOutcome> {
        let document = operation.document().ok_or_else(commit_not_dispatchable)?;
        let gate = &mut self.gate;
        let session = self.session.get_or_insert_with(|| gate.begin());

        match operation {
            Operation::Create { is_new, .. } => self.mirror.create(session, draft, &document, *is_new),
            Operation::Remove { .. } => self.mirror.remove(session, &document),
            Operation::Move {
                dest_id, dest_name, ..
            } => self.mirror.move_node(session, &document, dest_id, dest_name),
            Operation::Copy { .. } => self.mirror.copy(session, draft, &document),
            Operation::Reorder { dest_id, .. } => {
                self.sequencer.reorder(session, &document, dest_id.as_ref())
            }
            Operation::Publish { .. } => self.gate.publish(session, &document),
            Operation::Unpublish { .. } => self.gate.unpublish(session, &document),
            Operation::Commit => Err(commit_not_dispatchable()),
        }
    }

    /// Commit the unit in progress (an empty unit when none is open)
    pub fn commit(&mut self) -> MirrorResult<CommitReceipt> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.gate.begin(),
        };
        self.gate.commit(session)
    }

    /// Drop the unit in progress, returning how many staged changes were lost
    pub fn discard(&mut self) -> usize {
        match self.session.take() {
            Some(session) => {
                let lost = session.pending_count();
                self.gate.discard(session);
                lost
            }
            None => 0,
        }
    }

    /// Apply a whole log, unit by unit
    ///
    /// Stops at the first fatal error; units committed before it stay
    /// committed. Trailing operations without a commit stay staged.
    pub fn run(&mut self, draft: &Tree, log: &OperationLog) -> MirrorResult<RunReport> {
        let mut report = RunReport::default();

        for (unit, entries) in log.units().into_iter().enumerate() {
            for entry in entries {
                let outcome = self.apply(draft, &entry.operation).map_err(|source| {
                    MirrorError::UnitAborted {
                        unit,
                        sequence: entry.sequence,
                        source: Box::new(source),
                    }
                })?;

                match &outcome {
                    MirrorOutcome::Committed(receipt) => report.receipts.push(receipt.clone()),
                    other if other.is_noop() => report.skipped += 1,
                    _ => report.applied += 1,
                }
                report.outcomes.push(AppliedOperation {
                    sequence: entry.sequence,
                    operation: entry.operation.name(),
                    outcome,
                });
            }
        }

        report.uncommitted = self.session.as_ref().map_or(0, |s| s.pending_count());
        Ok(report)
    }
}

/// One operation as it went through the pipeline
#[derive(Debug, Clone)]
pub struct AppliedOperation {
    pub sequence: u64,
    pub operation: &'static str,
    pub outcome: MirrorOutcome,
}

/// Result of running an operation log
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Operations that changed the staged live tree
    pub applied: usize,

    /// No-op outcomes (already mirrored, unchanged, never published)
    pub skipped: usize,

    pub receipts: Vec<CommitReceipt>,

    /// Staged changes left without a commit
    pub uncommitted: usize,

    pub outcomes: Vec<AppliedOperation>,
}

fn commit_not_dispatchable() -> MirrorError {
    MirrorError::OperationLog("commit can't be dispatched to a session".to_string())
}
