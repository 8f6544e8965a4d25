//! # Identity Binding
//!
//! Live nodes carry the identifier of their draft counterpart and are marked
//! identity-bearing, so references resolve to the same content on both
//! sides.

use folio_tree::{Identifier, NodeKey, NodePath, Tree};
use serde::Serialize;

use crate::errors::{MirrorError, MirrorResult};
use crate::resolver::PathResolver;

/// Problem found by [`IdentityBinder::audit`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum IdentityIssue {
    /// Live node has no draft counterpart
    Orphaned { path: NodePath },

    /// Live and draft identifiers differ
    #[serde(rename_all = "camelCase")]
    Mismatch {
        path: NodePath,
        live: Option<Identifier>,
        draft: Option<Identifier>,
    },

    /// Live node is not identity-bearing
    NotReferenceable { path: NodePath },

    /// Live node has no `order` property
    MissingOrder { path: NodePath },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityBinder;

impl IdentityBinder {
    pub fn new() -> Self {
        Self
    }

    /// Bind `identifier` to the live node and mark it identity-bearing
    ///
    /// Fails when the node already carries another identifier or when the
    /// identifier is bound elsewhere in the live tree.
    pub fn bind(&self, live: &mut Tree, key: NodeKey, identifier: &Identifier) -> MirrorResult<()> {
        self.verify(live, key, identifier)?;
        if let Some(owner) = live.find_by_identifier(identifier) {
            if owner != key {
                return Err(MirrorError::violation(
                    "bind",
                    format!(
                        "identifier {} is already bound to {}",
                        identifier,
                        describe(live, owner)
                    ),
                ));
            }
        }

        live.set_identifier(key, identifier.clone())
            .map_err(|e| MirrorError::violation("bind", e))?;
        live.set_referenceable(key, true)
            .map_err(|e| MirrorError::violation("bind", e))?;
        Ok(())
    }

    /// Check that a live node is (or can become) the counterpart of `expected`
    pub fn verify(&self, live: &Tree, key: NodeKey, expected: &Identifier) -> MirrorResult<()> {
        let node = live
            .node(key)
            .ok_or_else(|| MirrorError::violation("bind", format!("live node #{:?} vanished", key)))?;

        match node.identifier() {
            Some(actual) if actual != expected => Err(MirrorError::violation(
                "bind",
                format!(
                    "{} carries identifier {} but its draft counterpart is {}",
                    describe(live, key),
                    actual,
                    expected
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Walk the live tree under the live root and report identity problems
    pub fn audit(&self, draft: &Tree, live: &Tree, resolver: &PathResolver) -> Vec<IdentityIssue> {
        let mut issues = Vec::new();
        let Some(live_root) = live.lookup(resolver.live_root()) else {
            return issues;
        };

        for key in live.walk(live_root).skip(1) {
            let (Some(node), Some(path)) = (live.node(key), live.path_of(key)) else {
                continue;
            };
            let draft_node = resolver
                .to_draft(&path)
                .ok()
                .and_then(|draft_path| draft.get(&draft_path));

            let Some(draft_node) = draft_node else {
                issues.push(IdentityIssue::Orphaned { path });
                continue;
            };

            if node.identifier().is_none() || node.identifier() != draft_node.identifier() {
                issues.push(IdentityIssue::Mismatch {
                    path: path.clone(),
                    live: node.identifier().cloned(),
                    draft: draft_node.identifier().cloned(),
                });
            }
            if !node.is_referenceable() {
                issues.push(IdentityIssue::NotReferenceable { path: path.clone() });
            }
            if node.order().is_none() {
                issues.push(IdentityIssue::MissingOrder { path });
            }
        }

        issues
    }
}

fn describe(tree: &Tree, key: NodeKey) -> String {
    tree.path_of(key)
        .map(|p| p.to_string())
        .unwrap_or_else(|| format!("{:?}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_tree::ORDER_PROPERTY;

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn test_bind_marks_node_identity_bearing() {
        let mut live = Tree::new();
        let key = live.insert(&p("/cmf"), None).unwrap();

        IdentityBinder.bind(&mut live, key, &Identifier::new("U0")).unwrap();

        let node = live.node(key).unwrap();
        assert!(node.is_referenceable());
        assert_eq!(node.identifier(), Some(&Identifier::new("U0")));
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut live = Tree::new();
        let key = live.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();

        assert!(IdentityBinder.bind(&mut live, key, &Identifier::new("U0")).is_ok());
    }

    #[test]
    fn test_bind_rejects_conflicting_identifier() {
        let mut live = Tree::new();
        let key = live.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();

        let err = IdentityBinder.bind(&mut live, key, &Identifier::new("U9")).unwrap_err();
        assert!(matches!(err, MirrorError::StructuralInvariantViolation { .. }));
    }

    #[test]
    fn test_bind_rejects_identifier_owned_elsewhere() {
        let mut live = Tree::new();
        live.insert(&p("/a"), Some(Identifier::new("U0"))).unwrap();
        let b = live.insert(&p("/b"), None).unwrap();

        let err = IdentityBinder.bind(&mut live, b, &Identifier::new("U0")).unwrap_err();
        assert!(err.to_string().contains("already bound to /a"), "got: {}", err);
    }

    #[test]
    fn test_audit_reports_every_issue_kind() {
        let mut draft = Tree::new();
        draft.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();
        draft.insert(&p("/cmf/a"), Some(Identifier::new("A"))).unwrap();

        let mut live = Tree::new();
        let cmf = live.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();
        live.set_property(cmf, ORDER_PROPERTY, 10).unwrap();
        let a = live.insert(&p("/cmf/a"), Some(Identifier::new("WRONG"))).unwrap();
        live.set_property(a, ORDER_PROPERTY, 10).unwrap();
        live.insert(&p("/cmf/ghost"), None).unwrap();

        let issues = IdentityBinder.audit(&draft, &live, &PathResolver::identity());

        assert_eq!(
            issues,
            vec![
                IdentityIssue::Mismatch {
                    path: p("/cmf/a"),
                    live: Some(Identifier::new("WRONG")),
                    draft: Some(Identifier::new("A")),
                },
                IdentityIssue::Orphaned { path: p("/cmf/ghost") },
            ]
        );
    }

    #[test]
    fn test_audit_of_consistent_trees_is_clean() {
        let mut draft = Tree::new();
        draft.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();

        let mut live = Tree::new();
        let cmf = live.insert(&p("/cmf"), Some(Identifier::new("U0"))).unwrap();
        live.set_property(cmf, ORDER_PROPERTY, 10).unwrap();

        assert!(IdentityBinder.audit(&draft, &live, &PathResolver::identity()).is_empty());
    }
}
