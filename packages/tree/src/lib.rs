//! # Folio Tree
//!
//! Hierarchical, path-addressed content store used for both the draft and
//! the live side of publication.
//!
//! Nodes are located by a slash-delimited [`NodePath`] and, once bound, by
//! an opaque [`Identifier`] that is unique within the tree.

pub mod error;
pub mod id_generator;
pub mod node;
pub mod path;
pub mod snapshot;
pub mod tree;

pub use error::{PathError, TreeError, TreeResult};
pub use id_generator::{checksum, get_store_id, UnitIdGenerator};
pub use node::{Identifier, Node, NodeKey, PropertyValue, ORDER_PROPERTY};
pub use path::{validate_name, NodePath};
pub use snapshot::NodeSnapshot;
pub use tree::{Tree, Walk};
