//! # Folio Mirror
//!
//! Publication mirror engine: keeps a publish-gated live tree consistent
//! with the draft tree it mirrors.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ draft tree + operation log (external)       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mirror: one publication unit at a time      │
//! │  - PathResolver: draft path → live path     │
//! │  - TreeMirror: create/remove/move/copy      │
//! │  - IdentityBinder: shared identifiers       │
//! │  - OrderSequencer: explicit sibling order   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ PublicationGate: read context + commit      │
//! │  - LiveStore: committed tree + revision     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Draft is read-only**: the engine never writes to the draft tree
//! 2. **Identity over paths**: a live node shares its draft identifier
//! 3. **Explicit session**: every live change goes through a
//!    [`PublicationSession`] owned by one unit
//! 4. **All or nothing**: a unit commits completely or not at all
//! 5. **Absence is normal**: "already mirrored" and "never published" are
//!    outcomes, not errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_mirror::{LiveStore, MirrorConfig, Operation, Pipeline};
//!
//! let mut pipeline = Pipeline::from_config(&MirrorConfig::default(), LiveStore::open("live.json")?)?;
//!
//! pipeline.apply(&draft, &Operation::Create { path, is_new: true, prior_path: None })?;
//! pipeline.apply(&draft, &Operation::Commit)?;
//!
//! let live = pipeline.gate().resolve(&path);
//! ```

mod config;
mod content;
mod errors;
mod gate;
mod history;
mod identity;
mod mirror;
mod operation;
mod outcome;
mod pipeline;
mod resolver;
mod sequencer;
mod session;
mod store;

pub use config::MirrorConfig;
pub use content::{ContentMapper, CopyProperties, StructureOnly};
pub use errors::{MirrorError, MirrorResult, StoreError};
pub use gate::PublicationGate;
pub use history::{CommitHistory, CommitReceipt};
pub use identity::{IdentityBinder, IdentityIssue};
pub use mirror::{CopyStep, TreeMirror};
pub use operation::{DocumentRef, LogEntry, Operation, OperationLog, PathBehavior};
pub use outcome::{LiveNodeRef, MirrorOutcome, ReadContext, ReadTarget, WorkflowStage};
pub use pipeline::{AppliedOperation, Pipeline, RunReport};
pub use resolver::PathResolver;
pub use sequencer::{OrderSequencer, DEFAULT_ORDER_STEP};
pub use session::{LiveChange, PendingChange, PublicationSession};
pub use store::LiveStore;

// Re-export tree types for convenience
pub use folio_tree::{Identifier, NodePath, Tree};
