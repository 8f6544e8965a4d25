//! # Tree Snapshots
//!
//! Nested, serde-friendly representation of a tree used for persistence
//! and fixtures:
//!
//! ```json
//! {
//!   "name": "",
//!   "children": [
//!     { "name": "cmf", "identifier": "U0", "referenceable": true,
//!       "properties": { "order": 10 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::node::{Identifier, NodeKey, PropertyValue};
use crate::tree::Tree;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub referenceable: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Number of nodes in this snapshot, itself included
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(snapshot) = stack.pop() {
            count += 1;
            stack.extend(snapshot.children.iter());
        }
        count
    }
}

impl Tree {
    /// Snapshot the whole tree
    pub fn to_snapshot(&self) -> NodeSnapshot {
        self.snapshot_of(self.root()).unwrap_or_default()
    }

    /// Snapshot the subtree rooted at `key`
    pub fn snapshot_of(&self, key: NodeKey) -> Option<NodeSnapshot> {
        let node = self.node(key)?;
        Some(NodeSnapshot {
            name: node.name().to_string(),
            identifier: node.identifier().cloned(),
            referenceable: node.is_referenceable(),
            properties: node.properties().clone(),
            children: node
                .children()
                .iter()
                .filter_map(|child| self.snapshot_of(*child))
                .collect(),
        })
    }

    /// Rebuild a tree from a root snapshot
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> TreeResult<Tree> {
        if !snapshot.name.is_empty() {
            return Err(TreeError::InvalidSnapshot(format!(
                "root node must be unnamed, found {:?}",
                snapshot.name
            )));
        }

        let mut tree = Tree::new();
        let mut worklist = vec![(tree.root(), snapshot)];
        while let Some((key, current)) = worklist.pop() {
            if let Some(identifier) = &current.identifier {
                tree.set_identifier(key, identifier.clone())?;
            }
            tree.set_referenceable(key, current.referenceable)?;
            for (name, value) in &current.properties {
                tree.set_property(key, name, value.clone())?;
            }
            for child in &current.children {
                let child_key = tree.add_child(key, &child.name)?;
                worklist.push((child_key, child));
            }
        }
        Ok(tree)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
    }

    pub fn from_json(json: &str) -> TreeResult<Tree> {
        let snapshot: NodeSnapshot = serde_json::from_str(json)
            .map_err(|e| TreeError::InvalidSnapshot(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }
}
