//! # Order Sequencer
//!
//! Keeps an explicit, gap-spaced `order` property on live siblings.
//!
//! Query-based reads sort by this property instead of relying on physical
//! storage order. New nodes are appended at `max + step`; a reorder always
//! renumbers the whole sibling list to `step, 2 * step, ...`.

use folio_tree::{Identifier, NodeKey, Tree, TreeResult, ORDER_PROPERTY};

use crate::errors::{MirrorError, MirrorResult};
use crate::operation::PathBehavior;
use crate::outcome::MirrorOutcome;
use crate::resolver::PathResolver;
use crate::session::{LiveChange, PublicationSession};

pub const DEFAULT_ORDER_STEP: i64 = 10;

#[derive(Debug, Clone)]
pub struct OrderSequencer {
    resolver: PathResolver,
    step: i64,
}

impl OrderSequencer {
    pub fn new(resolver: PathResolver, step: i64) -> Self {
        Self { resolver, step }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Order value for a node appended under `parent`
    pub fn next_order(&self, tree: &Tree, parent: NodeKey) -> i64 {
        tree.children(parent)
            .iter()
            .filter_map(|child| tree.node(*child).and_then(|n| n.order()))
            .max()
            .unwrap_or(0)
            + self.step
    }

    /// Renumber every child of `parent` in physical sequence
    pub fn renumber(&self, tree: &mut Tree, parent: NodeKey) -> TreeResult<usize> {
        let children = tree.children(parent).to_vec();
        let mut order = 0;
        for child in &children {
            order += self.step;
            tree.set_property(*child, ORDER_PROPERTY, order)?;
        }
        Ok(children.len())
    }

    /// Move the document before its sibling `dest_id` (last when `None`)
    /// and renumber all siblings
    ///
    /// A destination sibling that is not live yet is ignored and the node
    /// goes last; live order then matches draft order once that sibling
    /// gets published in front of it.
    pub fn reorder(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
        dest_id: Option<&Identifier>,
    ) -> MirrorResult<MirrorOutcome> {
        let live_path = self.resolver.to_live(document.path())?;
        let tree = session.tree();

        let Some(key) = tree.lookup(&live_path) else {
            tracing::warn!(path = %live_path, "reorder target was never published");
            return Ok(MirrorOutcome::NeverPublished { path: live_path });
        };
        let parent = tree
            .node(key)
            .and_then(|n| n.parent())
            .ok_or_else(|| MirrorError::violation("reorder", "the live root has no siblings"))?;

        let before = match dest_id {
            Some(dest_id) => match tree.find_by_identifier(dest_id) {
                Some(sibling) if tree.node(sibling).and_then(|n| n.parent()) == Some(parent) => {
                    Some(sibling)
                }
                Some(_) => {
                    return Err(MirrorError::violation(
                        "reorder",
                        format!("{} is not a sibling of {}", dest_id, live_path),
                    ));
                }
                None => {
                    tracing::debug!(path = %live_path, dest = %dest_id, "destination sibling not live, appending");
                    None
                }
            },
            None => None,
        };

        let tree = session.tree_mut();
        tree.order_before(key, before)
            .map_err(|e| MirrorError::violation("reorder", e))?;
        let siblings = self
            .renumber(tree, parent)
            .map_err(|e| MirrorError::violation("reorder", e))?;

        session.record(LiveChange::Reordered {
            path: live_path.clone(),
            siblings,
        });
        Ok(MirrorOutcome::Reordered {
            path: live_path,
            siblings,
        })
    }
}

impl Default for OrderSequencer {
    fn default() -> Self {
        Self::new(PathResolver::identity(), DEFAULT_ORDER_STEP)
    }
}
