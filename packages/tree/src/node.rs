use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the explicit sibling-order property
pub const ORDER_PROPERTY: &str = "order";

/// Opaque, stable identifier of a node, unique within its tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Property value stored on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// Arena slot of a node inside a [`crate::Tree`]
///
/// Keys are only meaningful for the tree that issued them and are never
/// reused within that tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) u64);

/// A single entry in a content tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) identifier: Option<Identifier>,
    pub(crate) referenceable: bool,
    pub(crate) properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    pub(crate) fn new(name: String, parent: Option<NodeKey>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            identifier: None,
            referenceable: false,
            properties: BTreeMap::new(),
        }
    }

    /// Node name (empty for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Children in physical storage order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// Whether the node is identity-bearing
    pub fn is_referenceable(&self) -> bool {
        self.referenceable
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Explicit sibling order, if assigned
    pub fn order(&self) -> Option<i64> {
        self.property(ORDER_PROPERTY).and_then(PropertyValue::as_integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_untagged_serde() {
        let values: Vec<PropertyValue> =
            serde_json::from_str(r#"[true, 10, 1.5, "title", [1, "a"]]"#).unwrap();

        assert_eq!(values[0], PropertyValue::Bool(true));
        assert_eq!(values[1], PropertyValue::Integer(10));
        assert_eq!(values[2], PropertyValue::Float(1.5));
        assert_eq!(values[3], PropertyValue::String("title".to_string()));
        assert_eq!(
            values[4],
            PropertyValue::List(vec![PropertyValue::Integer(1), PropertyValue::from("a")])
        );
    }

    #[test]
    fn test_order_reads_integer_property() {
        let mut node = Node::new("page".to_string(), None);
        assert_eq!(node.order(), None);

        node.properties.insert(ORDER_PROPERTY.to_string(), PropertyValue::Integer(20));
        assert_eq!(node.order(), Some(20));

        node.properties.insert(ORDER_PROPERTY.to_string(), PropertyValue::from("20"));
        assert_eq!(node.order(), None);
    }
}
