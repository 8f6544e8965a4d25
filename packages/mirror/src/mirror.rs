//! # Tree Mirror
//!
//! Applies structural draft operations to the staged live tree.
//!
//! ## Operation Semantics
//!
//! ### Create
//! - New node: no-op when the live path exists, otherwise create exactly
//!   that node under its already mirrored parent (never recursive)
//! - Existing node: rename the live node found at the prior path when the
//!   draft name changed
//!
//! ### Remove
//! - Removes the live node and all descendants
//!
//! ### Move
//! - Reparent + rename in one step; order is left alone
//!
//! ### Copy
//! - Mirrors the whole draft subtree, skipping nodes that already exist
//! - Traversal follows an explicit plan of (draft path, live path) pairs

use std::sync::Arc;

use folio_tree::{Identifier, Node, NodeKey, NodePath, Tree, ORDER_PROPERTY};

use crate::content::{ContentMapper, StructureOnly};
use crate::errors::{MirrorError, MirrorResult};
use crate::identity::IdentityBinder;
use crate::operation::PathBehavior;
use crate::outcome::MirrorOutcome;
use crate::resolver::PathResolver;
use crate::sequencer::OrderSequencer;
use crate::session::{LiveChange, PublicationSession};

/// One step of a copy: mirror `draft` onto `live`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStep {
    pub draft: NodePath,
    pub live: NodePath,
}

#[derive(Clone)]
pub struct TreeMirror {
    resolver: PathResolver,
    binder: IdentityBinder,
    sequencer: OrderSequencer,
    mapper: Arc<dyn ContentMapper>,
}

impl std::fmt::Debug for TreeMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeMirror")
            .field("resolver", &self.resolver)
            .field("sequencer", &self.sequencer)
            .field("mapper", &self.mapper.name())
            .finish()
    }
}

impl TreeMirror {
    pub fn new(resolver: PathResolver, sequencer: OrderSequencer) -> Self {
        Self {
            resolver,
            binder: IdentityBinder::new(),
            sequencer,
            mapper: Arc::new(StructureOnly),
        }
    }

    /// Use a different content mapper for created nodes
    pub fn with_mapper(mut self, mapper: Arc<dyn ContentMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Mirror a created (`is_new`) or renamed document
    pub fn create(
        &self,
        session: &mut PublicationSession,
        draft: &Tree,
        document: &dyn PathBehavior,
        is_new: bool,
    ) -> MirrorResult<MirrorOutcome> {
        let draft_node = find_draft_node(draft, document.path(), "create")?;
        let identifier = require_identifier(draft_node, document.path(), "create")?;

        if !is_new {
            return self.rename(session, document, draft_node, identifier);
        }

        let live_path = self.resolver.to_live(document.path())?;
        if session.tree().contains(&live_path) {
            tracing::debug!(path = %live_path, "already mirrored");
            return Ok(MirrorOutcome::AlreadyMirrored { path: live_path });
        }

        self.materialize(session, draft_node, &live_path, identifier, "create")?;
        Ok(MirrorOutcome::Created {
            path: live_path,
            count: 1,
        })
    }

    fn rename(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
        draft_node: &Node,
        identifier: &Identifier,
    ) -> MirrorResult<MirrorOutcome> {
        let prior = self.resolver.to_live(document.prior_path())?;
        let Some(key) = session.tree().lookup(&prior) else {
            tracing::warn!(path = %prior, "rename target was never published");
            return Ok(MirrorOutcome::NeverPublished { path: prior });
        };
        if prior == *self.resolver.live_root() {
            return Err(MirrorError::violation("create", "the live root can't be renamed"));
        }
        self.binder.verify(session.tree(), key, identifier)?;

        let new_name = draft_node.name();
        if prior.name() == Some(new_name) {
            return Ok(MirrorOutcome::Unchanged { path: prior });
        }

        session
            .tree_mut()
            .rename(key, new_name)
            .map_err(|e| MirrorError::violation("create", e))?;
        let renamed = session
            .tree()
            .path_of(key)
            .ok_or_else(|| MirrorError::violation("create", "renamed node lost its path"))?;

        session.record(LiveChange::Renamed {
            from: prior.clone(),
            to: renamed.clone(),
        });
        Ok(MirrorOutcome::Renamed {
            from: prior,
            to: renamed,
        })
    }

    /// Remove the live node at the document path with its subtree
    pub fn remove(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
    ) -> MirrorResult<MirrorOutcome> {
        let live_path = self.resolver.to_live(document.path())?;
        let tree = session.tree();
        let Some(key) = tree.lookup(&live_path) else {
            tracing::warn!(path = %live_path, "remove target was never published");
            return Ok(MirrorOutcome::NeverPublished { path: live_path });
        };
        if live_path == *self.resolver.live_root() {
            return Err(MirrorError::violation("remove", "the live root can't be removed"));
        }

        let released: Vec<Identifier> = tree
            .walk(key)
            .filter_map(|k| tree.node(k).and_then(|n| n.identifier().cloned()))
            .collect();
        session.release(released);

        let count = session
            .tree_mut()
            .remove(key)
            .map_err(|e| MirrorError::violation("remove", e))?;

        session.record(LiveChange::Removed {
            path: live_path.clone(),
            count,
        });
        Ok(MirrorOutcome::Removed {
            path: live_path,
            count,
        })
    }

    /// Reparent/rename the live node found at the document's prior path
    pub fn move_node(
        &self,
        session: &mut PublicationSession,
        document: &dyn PathBehavior,
        dest_id: &Identifier,
        dest_name: &str,
    ) -> MirrorResult<MirrorOutcome> {
        let live_path = self.resolver.to_live(document.prior_path())?;
        let tree = session.tree();
        let Some(key) = tree.lookup(&live_path) else {
            tracing::warn!(path = %live_path, "move source was never published");
            return Ok(MirrorOutcome::NeverPublished { path: live_path });
        };

        let dest = tree.find_by_identifier(dest_id).ok_or_else(|| {
            MirrorError::violation("move", format!("destination {} is not mirrored", dest_id))
        })?;
        let dest_path = tree
            .path_of(dest)
            .ok_or_else(|| MirrorError::violation("move", "destination lost its path"))?;
        if !dest_path.starts_with(self.resolver.live_root()) {
            return Err(MirrorError::outside_root(dest_path, self.resolver.live_root()));
        }

        session
            .tree_mut()
            .move_to(key, dest, dest_name)
            .map_err(|e| MirrorError::violation("move", e))?;
        let moved = session
            .tree()
            .path_of(key)
            .ok_or_else(|| MirrorError::violation("move", "moved node lost its path"))?;

        session.record(LiveChange::Moved {
            from: live_path.clone(),
            to: moved.clone(),
        });
        Ok(MirrorOutcome::Moved {
            from: live_path,
            to: moved,
        })
    }

    /// Pre-order list of (draft, live) pairs covering the draft subtree
    pub fn copy_plan(&self, draft: &Tree, source: &NodePath) -> MirrorResult<Vec<CopyStep>> {
        let root = draft.lookup(source).ok_or_else(|| {
            MirrorError::violation("copy", format!("draft node {} does not exist", source))
        })?;
        let live_root = self.resolver.to_live(source)?;

        let mut plan = Vec::new();
        let mut stack: Vec<(NodeKey, NodePath, NodePath)> = vec![(root, source.clone(), live_root)];
        while let Some((key, draft_path, live_path)) = stack.pop() {
            for child in draft.children(key).iter().rev() {
                let Some(node) = draft.node(*child) else {
                    continue;
                };
                stack.push((
                    *child,
                    draft_path.join(node.name())?,
                    live_path.join(node.name())?,
                ));
            }
            plan.push(CopyStep {
                draft: draft_path,
                live: live_path,
            });
        }
        Ok(plan)
    }

    /// Mirror a copied draft subtree into live
    pub fn copy(
        &self,
        session: &mut PublicationSession,
        draft: &Tree,
        document: &dyn PathBehavior,
    ) -> MirrorResult<MirrorOutcome> {
        let plan = self.copy_plan(draft, document.path())?;
        let mut created = 0;

        for step in &plan {
            let draft_node = find_draft_node(draft, &step.draft, "copy")?;
            let identifier = require_identifier(draft_node, &step.draft, "copy")?;

            match session.tree().lookup(&step.live) {
                Some(existing) => self.binder.verify(session.tree(), existing, identifier)?,
                None => {
                    self.materialize(session, draft_node, &step.live, identifier, "copy")?;
                    created += 1;
                }
            }
        }

        let root = plan
            .first()
            .map(|step| step.live.clone())
            .ok_or_else(|| MirrorError::violation("copy", "empty copy plan"))?;
        if created == 0 {
            return Ok(MirrorOutcome::AlreadyMirrored { path: root });
        }
        Ok(MirrorOutcome::Created {
            path: root,
            count: created,
        })
    }

    /// Create one live node under its already mirrored parent
    fn materialize(
        &self,
        session: &mut PublicationSession,
        draft_node: &Node,
        live_path: &NodePath,
        identifier: &Identifier,
        operation: &'static str,
    ) -> MirrorResult<NodeKey> {
        let (Some(parent_path), Some(name)) = (live_path.parent(), live_path.name()) else {
            return Err(MirrorError::violation(operation, "the live root can't be created"));
        };
        let parent = session.tree().lookup(&parent_path).ok_or_else(|| {
            MirrorError::violation(operation, format!("live parent {} is not mirrored", parent_path))
        })?;

        let order = self.sequencer.next_order(session.tree(), parent);
        let tree = session.tree_mut();
        if let Some(owner) = tree.find_by_identifier(identifier) {
            let owner_path = tree.path_of(owner).map(|p| p.to_string()).unwrap_or_default();
            return Err(MirrorError::violation(
                operation,
                format!("identifier {} is already live at {}", identifier, owner_path),
            ));
        }

        let key = tree
            .add_child(parent, name)
            .map_err(|e| MirrorError::violation(operation, e))?;
        self.binder.bind(tree, key, identifier)?;
        self.mapper
            .map(draft_node, tree, key)
            .map_err(|e| MirrorError::violation(operation, e))?;
        tree.set_property(key, ORDER_PROPERTY, order)
            .map_err(|e| MirrorError::violation(operation, e))?;

        session.record(LiveChange::Created {
            path: live_path.clone(),
            identifier: identifier.clone(),
        });
        Ok(key)
    }
}

impl Default for TreeMirror {
    fn default() -> Self {
        Self::new(PathResolver::identity(), OrderSequencer::default())
    }
}

fn find_draft_node<'a>(draft: &'a Tree, path: &NodePath, operation: &'static str) -> MirrorResult<&'a Node> {
    draft.get(path).ok_or_else(|| {
        MirrorError::violation(operation, format!("draft node {} does not exist", path))
    })
}

fn require_identifier<'a>(node: &'a Node, path: &NodePath, operation: &'static str) -> MirrorResult<&'a Identifier> {
    node.identifier().ok_or_else(|| {
        MirrorError::violation(operation, format!("draft node {} carries no identifier", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CopyProperties;
    use crate::operation::DocumentRef;
    use folio_tree::PropertyValue;

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw)
    }

    fn draft() -> Tree {
        let mut draft = Tree::new();
        draft.insert(&p("/cmf"), Some(id("U0"))).unwrap();
        draft.insert(&p("/cmf/sulu"), Some(id("U1"))).unwrap();
        draft
    }

    fn live_session(paths: &[(&str, &str)]) -> PublicationSession {
        let mut live = Tree::new();
        for (path, identifier) in paths {
            let key = live.insert(&p(path), Some(id(identifier))).unwrap();
            live.set_property(key, ORDER_PROPERTY, 10).unwrap();
        }
        PublicationSession::new("unit-1".to_string(), 0, live)
    }

    #[test]
    fn test_create_new_node_binds_identity() {
        let mut session = live_session(&[("/cmf", "U0")]);
        let outcome = TreeMirror::default()
            .create(&mut session, &draft(), &DocumentRef::new(p("/cmf/sulu")), true)
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::Created { path: p("/cmf/sulu"), count: 1 });
        let node = session.tree().get(&p("/cmf/sulu")).unwrap();
        assert_eq!(node.identifier(), Some(&id("U1")));
        assert!(node.is_referenceable());
        assert_eq!(node.order(), Some(10));
    }

    #[test]
    fn test_create_requires_mirrored_parent() {
        let mut session = live_session(&[]);
        let err = TreeMirror::default()
            .create(&mut session, &draft(), &DocumentRef::new(p("/cmf/sulu")), true)
            .unwrap_err();

        assert!(matches!(err, MirrorError::StructuralInvariantViolation { operation: "create", .. }));
        assert!(session.tree().is_empty());
    }

    #[test]
    fn test_create_rejects_identifier_live_elsewhere() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/old-sulu", "U1")]);
        let err = TreeMirror::default()
            .create(&mut session, &draft(), &DocumentRef::new(p("/cmf/sulu")), true)
            .unwrap_err();

        assert!(err.to_string().contains("already live at /cmf/old-sulu"), "got: {}", err);
    }

    #[test]
    fn test_create_with_copy_properties_mapper() {
        let mut draft = draft();
        let key = draft.lookup(&p("/cmf/sulu")).unwrap();
        draft.set_property(key, "title", "Sulu").unwrap();
        draft.set_property(key, ORDER_PROPERTY, 99).unwrap();

        let mut session = live_session(&[("/cmf", "U0")]);
        TreeMirror::default()
            .with_mapper(Arc::new(CopyProperties))
            .create(&mut session, &draft, &DocumentRef::new(p("/cmf/sulu")), true)
            .unwrap();

        let node = session.tree().get(&p("/cmf/sulu")).unwrap();
        assert_eq!(node.property("title"), Some(&PropertyValue::from("Sulu")));
        assert_eq!(node.order(), Some(10));
    }

    #[test]
    fn test_rename_of_unchanged_name_is_noop() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/sulu", "U1")]);
        let outcome = TreeMirror::default()
            .create(&mut session, &draft(), &DocumentRef::new(p("/cmf/sulu")), false)
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::Unchanged { path: p("/cmf/sulu") });
        assert!(session.is_empty());
    }

    #[test]
    fn test_rename_detects_identity_mismatch() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/sulu", "OTHER")]);
        let err = TreeMirror::default()
            .create(&mut session, &draft(), &DocumentRef::new(p("/cmf/sulu")), false)
            .unwrap_err();

        assert!(matches!(err, MirrorError::StructuralInvariantViolation { .. }));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/sulu", "U1"), ("/cmf/sulu/x", "X")]);
        let outcome = TreeMirror::default()
            .remove(&mut session, &DocumentRef::new(p("/cmf/sulu")))
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::Removed { path: p("/cmf/sulu"), count: 2 });
        assert!(!session.tree().contains(&p("/cmf/sulu")));
        assert_eq!(session.tree().find_by_identifier(&id("X")), None);
    }

    #[test]
    fn test_remove_missing_target_is_never_published() {
        let mut session = live_session(&[("/cmf", "U0")]);
        let outcome = TreeMirror::default()
            .remove(&mut session, &DocumentRef::new(p("/gone/deeper")))
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::NeverPublished { path: p("/gone/deeper") });
    }

    #[test]
    fn test_move_reparents_by_destination_identifier() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/a", "A"), ("/cmf/b", "B")]);
        let outcome = TreeMirror::default()
            .move_node(&mut session, &DocumentRef::new(p("/cmf/b")), &id("A"), "b2")
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::Moved { from: p("/cmf/b"), to: p("/cmf/a/b2") });
        let moved = session.tree().get(&p("/cmf/a/b2")).unwrap();
        assert_eq!(moved.identifier(), Some(&id("B")));
        assert_eq!(moved.order(), Some(10), "move keeps the order value");
    }

    #[test]
    fn test_move_to_unmirrored_destination_is_violation() {
        let mut session = live_session(&[("/cmf", "U0"), ("/cmf/a", "A")]);
        let err = TreeMirror::default()
            .move_node(&mut session, &DocumentRef::new(p("/cmf/a")), &id("NOPE"), "a")
            .unwrap_err();

        assert!(matches!(err, MirrorError::StructuralInvariantViolation { operation: "move", .. }));
    }

    #[test]
    fn test_copy_plan_is_preorder() {
        let mut draft = draft();
        draft.insert(&p("/cmf/sulu/a"), Some(id("A"))).unwrap();
        draft.insert(&p("/cmf/sulu/a/a1"), Some(id("A1"))).unwrap();
        draft.insert(&p("/cmf/sulu/b"), Some(id("B"))).unwrap();

        let plan = TreeMirror::default().copy_plan(&draft, &p("/cmf/sulu")).unwrap();
        let drafts: Vec<&str> = plan.iter().map(|s| s.draft.as_str()).collect();

        assert_eq!(drafts, vec!["/cmf/sulu", "/cmf/sulu/a", "/cmf/sulu/a/a1", "/cmf/sulu/b"]);
    }

    #[test]
    fn test_copy_assigns_orders_in_draft_sequence() {
        let mut draft = draft();
        draft.insert(&p("/cmf/sulu/b"), Some(id("B"))).unwrap();
        draft.insert(&p("/cmf/sulu/a"), Some(id("A"))).unwrap();

        let mut session = live_session(&[("/cmf", "U0")]);
        let outcome = TreeMirror::default()
            .copy(&mut session, &draft, &DocumentRef::new(p("/cmf/sulu")))
            .unwrap();

        assert_eq!(outcome, MirrorOutcome::Created { path: p("/cmf/sulu"), count: 3 });
        let tree = session.tree();
        assert_eq!(tree.get(&p("/cmf/sulu/b")).unwrap().order(), Some(10));
        assert_eq!(tree.get(&p("/cmf/sulu/a")).unwrap().order(), Some(20));
    }

    #[test]
    fn test_copy_requires_identifiers_on_draft_nodes() {
        let mut draft = draft();
        draft.insert(&p("/cmf/sulu/anonymous"), None).unwrap();

        let mut session = live_session(&[("/cmf", "U0")]);
        let err = TreeMirror::default()
            .copy(&mut session, &draft, &DocumentRef::new(p("/cmf/sulu")))
            .unwrap_err();

        assert!(err.to_string().contains("carries no identifier"), "got: {}", err);
    }
}
