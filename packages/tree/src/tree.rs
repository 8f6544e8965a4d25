//! # Content Tree
//!
//! Arena-backed hierarchy of [`Node`]s addressed by [`NodePath`] and
//! [`Identifier`].
//!
//! ## Invariants
//!
//! - Sibling names are unique under a parent
//! - An identifier is bound to at most one node
//! - Children keep their physical (insertion / reorder) sequence
//! - The root has no name and can't be removed, renamed or moved

use std::collections::HashMap;

use crate::error::{TreeError, TreeResult};
use crate::node::{Identifier, Node, NodeKey, PropertyValue};
use crate::path::{validate_name, NodePath};

/// A rooted content tree
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
    identifiers: HashMap<Identifier, NodeKey>,
    next_key: u64,
}

impl Tree {
    /// Create a tree holding only the root node
    pub fn new() -> Self {
        let root = NodeKey(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(String::new(), None));

        Self {
            nodes,
            root,
            identifiers: HashMap::new(),
            next_key: 1,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    /// Find the node at `path`
    pub fn lookup(&self, path: &NodePath) -> Option<NodeKey> {
        let mut current = self.root;
        for segment in path.segments() {
            current = self.child_by_name(current, segment)?;
        }
        Some(current)
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        self.lookup(path).and_then(|key| self.node(key))
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.lookup(path).is_some()
    }

    pub fn find_by_identifier(&self, identifier: &Identifier) -> Option<NodeKey> {
        self.identifiers.get(identifier).copied()
    }

    pub fn child_by_name(&self, parent: NodeKey, name: &str) -> Option<NodeKey> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).is_some_and(|n| n.name == name))
    }

    /// Children of `key` in physical order (empty when `key` is unknown)
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.node(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Compute the absolute path of a node
    pub fn path_of(&self, key: NodeKey) -> Option<NodePath> {
        let mut names = Vec::new();
        let mut current = self.node(key)?;
        while let Some(parent) = current.parent {
            names.push(current.name.as_str());
            current = self.node(parent)?;
        }
        names.reverse();
        NodePath::parse(&format!("/{}", names.join("/"))).ok()
    }

    /// Pre-order traversal starting at (and including) `key`
    ///
    /// Uses an explicit stack, so depth is bounded only by memory.
    pub fn walk(&self, key: NodeKey) -> Walk<'_> {
        let stack = if self.nodes.contains_key(&key) { vec![key] } else { Vec::new() };
        Walk { tree: self, stack }
    }

    /// Append a new child named `name` under `parent`
    pub fn add_child(&mut self, parent: NodeKey, name: &str) -> TreeResult<NodeKey> {
        validate_name(name)?;
        if !self.nodes.contains_key(&parent) {
            return Err(TreeError::NodeNotFound(self.describe(parent)));
        }
        if self.child_by_name(parent, name).is_some() {
            return Err(TreeError::name_conflict(self.describe(parent), name));
        }

        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(key, Node::new(name.to_string(), Some(parent)));
        self.node_mut(parent)?.children.push(key);
        Ok(key)
    }

    /// Create the node at `path`; its parent must already exist
    ///
    /// When an identifier is given the node is also made identity-bearing.
    pub fn insert(&mut self, path: &NodePath, identifier: Option<Identifier>) -> TreeResult<NodeKey> {
        let (parent, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(TreeError::RootImmutable("created")),
        };
        let parent_key = self
            .lookup(&parent)
            .ok_or_else(|| TreeError::ParentNotFound(path.to_string()))?;

        let key = self.add_child(parent_key, name)?;
        if let Some(identifier) = identifier {
            self.set_identifier(key, identifier)?;
            self.set_referenceable(key, true)?;
        }
        Ok(key)
    }

    /// Remove a node together with its whole subtree
    ///
    /// Returns the number of nodes removed.
    pub fn remove(&mut self, key: NodeKey) -> TreeResult<usize> {
        if key == self.root {
            return Err(TreeError::RootImmutable("removed"));
        }
        let parent = self
            .node(key)
            .ok_or_else(|| TreeError::NodeNotFound(self.describe(key)))?
            .parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != key);
        }

        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                if let Some(identifier) = &node.identifier {
                    if self.identifiers.get(identifier) == Some(&current) {
                        self.identifiers.remove(identifier);
                    }
                }
                stack.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Rename a node in place, keeping its position among siblings
    pub fn rename(&mut self, key: NodeKey, new_name: &str) -> TreeResult<()> {
        if key == self.root {
            return Err(TreeError::RootImmutable("renamed"));
        }
        validate_name(new_name)?;
        let node = self
            .node(key)
            .ok_or_else(|| TreeError::NodeNotFound(self.describe(key)))?;
        if node.name == new_name {
            return Ok(());
        }
        if let Some(parent) = node.parent {
            if self.child_by_name(parent, new_name).is_some() {
                return Err(TreeError::name_conflict(self.describe(parent), new_name));
            }
        }
        self.node_mut(key)?.name = new_name.to_string();
        Ok(())
    }

    /// Reparent and rename a node in one step
    ///
    /// The node is appended as the last child of `new_parent`.
    pub fn move_to(&mut self, key: NodeKey, new_parent: NodeKey, new_name: &str) -> TreeResult<()> {
        if key == self.root {
            return Err(TreeError::RootImmutable("moved"));
        }
        validate_name(new_name)?;
        let old_parent = self
            .node(key)
            .ok_or_else(|| TreeError::NodeNotFound(self.describe(key)))?
            .parent;
        if !self.nodes.contains_key(&new_parent) {
            return Err(TreeError::ParentNotFound(self.describe(new_parent)));
        }
        if self.is_ancestor_or_self(key, new_parent) {
            return Err(TreeError::CycleDetected(self.describe(key)));
        }
        if let Some(existing) = self.child_by_name(new_parent, new_name) {
            if existing != key {
                return Err(TreeError::name_conflict(self.describe(new_parent), new_name));
            }
        }

        if old_parent == Some(new_parent) {
            self.node_mut(key)?.name = new_name.to_string();
            return Ok(());
        }
        if let Some(old_parent) = old_parent {
            self.node_mut(old_parent)?.children.retain(|child| *child != key);
        }
        self.node_mut(new_parent)?.children.push(key);
        let node = self.node_mut(key)?;
        node.parent = Some(new_parent);
        node.name = new_name.to_string();
        Ok(())
    }

    /// Move `key` directly before its sibling `before`, or to the end
    pub fn order_before(&mut self, key: NodeKey, before: Option<NodeKey>) -> TreeResult<()> {
        if key == self.root {
            return Err(TreeError::RootImmutable("reordered"));
        }
        if before == Some(key) {
            return Ok(());
        }
        let parent = self
            .node(key)
            .ok_or_else(|| TreeError::NodeNotFound(self.describe(key)))?
            .parent
            .ok_or(TreeError::RootImmutable("reordered"))?;

        if let Some(sibling) = before {
            let sibling_parent = self.node(sibling).and_then(|n| n.parent);
            if sibling_parent != Some(parent) {
                return Err(TreeError::not_siblings(self.describe(key), self.describe(sibling)));
            }
        }

        let children = &mut self.node_mut(parent)?.children;
        children.retain(|child| *child != key);
        let index = before.and_then(|sibling| children.iter().position(|child| *child == sibling));
        match index {
            Some(index) => children.insert(index, key),
            None => children.push(key),
        }
        Ok(())
    }

    /// Bind an identifier to a node, replacing any previous one
    pub fn set_identifier(&mut self, key: NodeKey, identifier: Identifier) -> TreeResult<()> {
        if let Some(owner) = self.identifiers.get(&identifier) {
            if *owner != key {
                return Err(TreeError::DuplicateIdentifier(identifier.to_string()));
            }
        }
        let previous = self.node_mut(key)?.identifier.replace(identifier.clone());
        if let Some(previous) = previous {
            self.identifiers.remove(&previous);
        }
        self.identifiers.insert(identifier, key);
        Ok(())
    }

    pub fn set_referenceable(&mut self, key: NodeKey, referenceable: bool) -> TreeResult<()> {
        self.node_mut(key)?.referenceable = referenceable;
        Ok(())
    }

    pub fn set_property(
        &mut self,
        key: NodeKey,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> TreeResult<Option<PropertyValue>> {
        Ok(self.node_mut(key)?.properties.insert(name.to_string(), value.into()))
    }

    fn node_mut(&mut self, key: NodeKey) -> TreeResult<&mut Node> {
        self.nodes
            .get_mut(&key)
            .ok_or_else(|| TreeError::NodeNotFound(format!("#{}", key.0)))
    }

    /// True when `ancestor` is `key` itself or one of its ancestors
    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.node(k).and_then(|n| n.parent);
        }
        false
    }

    /// Human-readable reference for error messages
    fn describe(&self, key: NodeKey) -> String {
        self.path_of(key)
            .map(|path| path.to_string())
            .unwrap_or_else(|| format!("#{}", key.0))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order iterator returned by [`Tree::walk`]
#[derive(Debug)]
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeKey>,
}

impl Iterator for Walk<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        if let Some(node) = self.tree.node(key) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.insert(&p("/cmf"), Some(Identifier::new("cmf"))).unwrap();
        tree.insert(&p("/cmf/a"), Some(Identifier::new("A"))).unwrap();
        tree.insert(&p("/cmf/b"), Some(Identifier::new("B"))).unwrap();
        tree.insert(&p("/cmf/a/a1"), Some(Identifier::new("A1"))).unwrap();
        tree
    }

    fn child_names(tree: &Tree, path: &str) -> Vec<String> {
        let key = tree.lookup(&p(path)).unwrap();
        tree.children(key)
            .iter()
            .map(|c| tree.node(*c).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_insert_and_lookup() {
        let tree = sample();
        assert_eq!(tree.len(), 5);

        let key = tree.lookup(&p("/cmf/a/a1")).unwrap();
        let node = tree.node(key).unwrap();
        assert_eq!(node.name(), "a1");
        assert_eq!(node.identifier(), Some(&Identifier::new("A1")));
        assert!(node.is_referenceable());
        assert_eq!(tree.path_of(key), Some(p("/cmf/a/a1")));
        assert_eq!(tree.find_by_identifier(&Identifier::new("A1")), Some(key));
        assert_eq!(tree.path_of(tree.root()), Some(NodePath::root()));
    }

    #[test]
    fn test_insert_requires_parent() {
        let mut tree = Tree::new();
        let result = tree.insert(&p("/cmf/sulu"), None);
        assert!(matches!(result, Err(TreeError::ParentNotFound(_))));
    }

    #[test]
    fn test_sibling_names_are_unique() {
        let mut tree = sample();
        let result = tree.insert(&p("/cmf/a"), None);
        assert!(matches!(result, Err(TreeError::NameConflict { .. })));
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut tree = sample();
        let result = tree.insert(&p("/cmf/c"), Some(Identifier::new("A")));
        assert_eq!(result, Err(TreeError::DuplicateIdentifier("A".to_string())));
    }

    #[test]
    fn test_remove_drops_subtree_and_identifiers() {
        let mut tree = sample();
        let key = tree.lookup(&p("/cmf/a")).unwrap();

        assert_eq!(tree.remove(key).unwrap(), 2);
        assert!(!tree.contains(&p("/cmf/a")));
        assert!(!tree.contains(&p("/cmf/a/a1")));
        assert_eq!(tree.find_by_identifier(&Identifier::new("A1")), None);
        assert_eq!(child_names(&tree, "/cmf"), vec!["b"]);
    }

    #[test]
    fn test_root_is_immutable() {
        let mut tree = sample();
        let root = tree.root();
        assert!(tree.remove(root).is_err());
        assert!(tree.rename(root, "x").is_err());
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut tree = sample();
        let key = tree.lookup(&p("/cmf/a")).unwrap();
        tree.rename(key, "z").unwrap();

        assert_eq!(child_names(&tree, "/cmf"), vec!["z", "b"]);
        assert!(tree.contains(&p("/cmf/z/a1")));
    }

    #[test]
    fn test_move_reparents_and_renames() {
        let mut tree = sample();
        let b = tree.lookup(&p("/cmf/b")).unwrap();
        let a = tree.lookup(&p("/cmf/a")).unwrap();

        tree.move_to(b, a, "b-moved").unwrap();

        assert_eq!(tree.path_of(b), Some(p("/cmf/a/b-moved")));
        assert_eq!(child_names(&tree, "/cmf/a"), vec!["a1", "b-moved"]);
        assert_eq!(child_names(&tree, "/cmf"), vec!["a"]);
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let mut tree = sample();
        let a = tree.lookup(&p("/cmf/a")).unwrap();
        let a1 = tree.lookup(&p("/cmf/a/a1")).unwrap();

        assert!(matches!(tree.move_to(a, a1, "a"), Err(TreeError::CycleDetected(_))));
        assert!(matches!(tree.move_to(a, a, "a"), Err(TreeError::CycleDetected(_))));
    }

    #[test]
    fn test_order_before() {
        let mut tree = sample();
        tree.insert(&p("/cmf/c"), None).unwrap();
        let a = tree.lookup(&p("/cmf/a")).unwrap();
        let c = tree.lookup(&p("/cmf/c")).unwrap();

        tree.order_before(c, Some(a)).unwrap();
        assert_eq!(child_names(&tree, "/cmf"), vec!["c", "a", "b"]);

        tree.order_before(c, None).unwrap();
        assert_eq!(child_names(&tree, "/cmf"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_order_before_rejects_non_siblings() {
        let mut tree = sample();
        let b = tree.lookup(&p("/cmf/b")).unwrap();
        let a1 = tree.lookup(&p("/cmf/a/a1")).unwrap();

        assert!(matches!(tree.order_before(b, Some(a1)), Err(TreeError::NotSiblings { .. })));
    }

    #[test]
    fn test_walk_is_preorder_in_physical_order() {
        let tree = sample();
        let cmf = tree.lookup(&p("/cmf")).unwrap();
        let paths: Vec<String> = tree
            .walk(cmf)
            .map(|key| tree.path_of(key).unwrap().to_string())
            .collect();

        assert_eq!(paths, vec!["/cmf", "/cmf/a", "/cmf/a/a1", "/cmf/b"]);
    }
}
