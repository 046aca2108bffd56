//! Canonical node descriptor types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Name of the synthetic back-link attribute carried by every [`Node`].
pub const REFERENCES_ATTRIBUTE: &str = "references";

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of a node: STEP instance number or IFCX fragment path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Entity(u64),
    Path(String),
}

impl NodeId {
    pub fn as_entity(&self) -> Option<u64> {
        match self {
            NodeId::Entity(id) => Some(*id),
            NodeId::Path(_) => None,
        }
    }

    /// The identifier as a graph path. Entity numbers are rendered in
    /// decimal so numeric-looking paths stay reachable.
    pub fn to_path(&self) -> String {
        match self {
            NodeId::Entity(id) => id.to_string(),
            NodeId::Path(path) => path.clone(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Entity(id) => write!(f, "#{id}"),
            NodeId::Path(path) => f.write_str(path),
        }
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    /// `#12` and `12` parse as entity ids, anything else as a path. Graph
    /// backends still resolve an entity id against a literal `#12` path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = digits.parse() {
                return Ok(NodeId::Entity(id));
            }
        }
        Ok(NodeId::Path(s.to_string()))
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId::Entity(id)
    }
}

impl From<&str> for NodeId {
    fn from(path: &str) -> Self {
        NodeId::Path(path.to_string())
    }
}

impl From<String> for NodeId {
    fn from(path: String) -> Self {
        NodeId::Path(path)
    }
}

// ============================================================================
// Values
// ============================================================================

/// A literal attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    /// Composite scalar such as a coordinate triple.
    Tuple(Vec<Scalar>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Real(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// One entry of an attribute: either a literal or a link to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Content {
    #[serde(rename = "value")]
    Value(Scalar),
    #[serde(rename = "id")]
    Reference(NodeId),
}

impl Content {
    pub fn reference(&self) -> Option<&NodeId> {
        match self {
            Content::Reference(id) => Some(id),
            Content::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Scalar> {
        match self {
            Content::Value(v) => Some(v),
            Content::Reference(_) => None,
        }
    }
}

// ============================================================================
// Attributes and nodes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub contents: Vec<Content>,
    /// Set when the contents were computed by following links backward.
    pub inverse: bool,
}

impl Attribute {
    pub fn forward(name: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            name: name.into(),
            contents,
            inverse: false,
        }
    }

    pub fn inverse(name: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            name: name.into(),
            contents,
            inverse: true,
        }
    }

    /// The synthetic back-link bucket.
    pub fn references<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self::inverse(
            REFERENCES_ATTRIBUTE,
            ids.into_iter().map(Content::Reference).collect(),
        )
    }

    pub fn reference_targets(&self) -> impl Iterator<Item = &NodeId> {
        self.contents.iter().filter_map(Content::reference)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Canonical, backend-agnostic description of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub attributes: Vec<Attribute>,
    pub references: Attribute,
}

impl Node {
    pub fn new(id: NodeId, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            attributes: Vec::new(),
            references: Attribute::references(std::iter::empty()),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Every target reachable through an `inverse=true` attribute other
    /// than `references`.
    pub fn declared_inverse_targets(&self) -> HashSet<&NodeId> {
        self.attributes
            .iter()
            .filter(|a| a.inverse)
            .flat_map(Attribute::reference_targets)
            .collect()
    }
}
