//! Type-indexed search listing.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_DISPLAY_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: NodeId,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBucket {
    pub items: Vec<SearchItem>,
}

/// Mapping from node type to its items. Buckets iterate in type-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchIndex(BTreeMap<String, SearchBucket>);

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node_type: impl Into<String>, item: SearchItem) {
        self.0.entry(node_type.into()).or_default().items.push(item);
    }

    /// Sort every bucket ascending by id. Stable, so equal ids keep
    /// insertion order.
    pub fn sorted(mut self) -> Self {
        for bucket in self.0.values_mut() {
            bucket.items.sort_by(|a, b| a.id.cmp(&b.id));
        }
        self
    }

    pub fn bucket(&self, node_type: &str) -> Option<&SearchBucket> {
        self.0.get(node_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(|b| b.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SearchBucket)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// `#id`, then GUID, then human name, skipping absent parts.
pub fn display_name(id: &NodeId, guid: Option<&str>, name: Option<&str>, separator: &str) -> String {
    let mut parts = vec![id.to_string()];
    parts.extend(guid.map(str::to_string));
    parts.extend(name.map(str::to_string));
    parts.join(separator)
}
