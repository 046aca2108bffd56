//! Fragment composition
//!
//! Turns any number of version-checked documents into one graph:
//!
//! 1. merge fragments by identifier, key by key, last write wins
//! 2. synthesize empty stubs for edge targets no fragment defines
//! 3. name every node after the edge pointing at it (`children` first, then
//!    `inherits`); nodes nobody points at are named [`ROOT_NAME`]
//! 4. fold stray `"{parent}/{edge}"` fragments into the edge's real target
//! 5. build the reverse index (target -> referrers)
//!
//! Nodes live in an arena in first-seen order. Every cross-reference is an
//! identifier looked up through the index, never a pointer.

use crate::document::{IfcxDocument, RawFragment};
use crate::value::{flatten_attributes, AttrValue, OrderedMap};
use ifcgraph_model::Result;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Name given to nodes that are not the target of any edge.
pub const ROOT_NAME: &str = "root";

/// A composed graph node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub identifier: String,
    pub name: Option<String>,
    pub children: OrderedMap<String>,
    pub inherits: OrderedMap<String>,
    pub attributes: OrderedMap<AttrValue>,
}

impl Fragment {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// `children` edges, then `inherits` edges, each in map order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &String)> {
        self.children.iter().chain(self.inherits.iter())
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(ROOT_NAME)
    }

    fn merge(&mut self, raw: &RawFragment) {
        merge_edges(&mut self.children, &raw.children, &self.identifier);
        merge_edges(&mut self.inherits, &raw.inherits, &self.identifier);
        for (key, value) in &raw.attributes {
            self.attributes.insert(key.as_str(), AttrValue::from(value));
        }
    }

    /// Take over `other`'s entries for keys this fragment does not have.
    fn absorb(&mut self, other: Fragment) {
        for (k, v) in other.children {
            self.children.insert_missing(k, v);
        }
        for (k, v) in other.inherits {
            self.inherits.insert_missing(k, v);
        }
        for (k, v) in other.attributes {
            self.attributes.insert_missing(k, v);
        }
    }
}

fn merge_edges(edges: &mut OrderedMap<String>, raw: &Map<String, Value>, owner: &str) {
    for (name, target) in raw {
        match target {
            Value::String(target) => edges.insert(name.as_str(), target.clone()),
            Value::Null => {
                edges.remove(name);
            }
            other => warn!(node = owner, edge = %name, value = %other, "ignoring non-string edge target"),
        }
    }
}

/// Recoverable anomalies seen while composing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionDiagnostics {
    pub malformed_fragments: usize,
    pub synthesized_stubs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ComposedGraph {
    nodes: Vec<Fragment>,
    index: HashMap<String, usize>,
    /// target identifier -> referrer identifiers, discovery order, no repeats
    reverse: HashMap<String, Vec<String>>,
    diagnostics: CompositionDiagnostics,
}

impl ComposedGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.nodes.iter()
    }

    pub fn get(&self, identifier: &str) -> Option<&Fragment> {
        self.index.get(identifier).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// Identifiers of the nodes that point at `identifier`.
    pub fn referrers(&self, identifier: &str) -> &[String] {
        self.reverse.get(identifier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes named [`ROOT_NAME`], arena order.
    pub fn roots(&self) -> impl Iterator<Item = &Fragment> {
        self.nodes
            .iter()
            .filter(|n| n.name.as_deref() == Some(ROOT_NAME))
    }

    pub fn diagnostics(&self) -> CompositionDiagnostics {
        self.diagnostics
    }

    fn get_or_insert(&mut self, identifier: &str) -> &mut Fragment {
        let idx = match self.index.get(identifier) {
            Some(&idx) => idx,
            None => {
                self.nodes.push(Fragment::new(identifier));
                let idx = self.nodes.len() - 1;
                self.index.insert(identifier.to_string(), idx);
                idx
            }
        };
        &mut self.nodes[idx]
    }

    fn remove(&mut self, identifier: &str) -> Option<Fragment> {
        let idx = self.index.remove(identifier)?;
        let removed = self.nodes.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Append a stub for every edge target no fragment defined.
    fn close_edges(&mut self) {
        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        for node in &self.nodes {
            for (_, target) in node.edges() {
                if !self.index.contains_key(target) && seen.insert(target.clone()) {
                    missing.push(target.clone());
                }
            }
        }
        self.diagnostics.synthesized_stubs = missing.len();
        for target in missing {
            debug!(node = %target, "synthesizing stub for dangling edge target");
            self.get_or_insert(&target);
        }
    }

    fn assign_names(&mut self) {
        let mut assignments = Vec::new();
        for node in &self.nodes {
            for (name, target) in node.edges() {
                assignments.push((target.clone(), name.to_string()));
            }
        }
        for (target, name) in assignments {
            if let Some(&idx) = self.index.get(&target) {
                self.nodes[idx].name = Some(name);
            }
        }
        for node in &mut self.nodes {
            if node.name.is_none() {
                node.name = Some(ROOT_NAME.to_string());
            }
        }
    }

    /// Fold `"{parent}/{edge}"` placeholders into the edge's real target.
    ///
    /// Only fires when the placeholder exists, is not the target itself and
    /// nothing links to it.
    fn repair_orphans(&mut self) {
        let targeted: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.edges().map(|(_, t)| t.as_str()))
            .collect();

        let mut repairs: Vec<(String, String)> = Vec::new();
        let mut queued = HashSet::new();
        for node in &self.nodes {
            for (name, target) in node.edges() {
                let placeholder = format!("{}/{}", node.identifier, name);
                if placeholder != *target
                    && !targeted.contains(placeholder.as_str())
                    && self.index.contains_key(&placeholder)
                    && queued.insert(placeholder.clone())
                {
                    repairs.push((placeholder, target.clone()));
                }
            }
        }

        for (placeholder, target) in repairs {
            if !self.contains(&target) {
                continue;
            }
            let Some(stray) = self.remove(&placeholder) else {
                continue;
            };
            warn!(
                placeholder = %placeholder,
                target = %target,
                "merging malformed fragment into its edge target"
            );
            self.get_or_insert(&target).absorb(stray);
            self.diagnostics.malformed_fragments += 1;
        }
    }

    /// Whether `value`, held by `owner`, names another node of this graph.
    fn names_other_node(&self, value: &AttrValue, owner: &str) -> bool {
        value
            .as_str()
            .is_some_and(|id| id != owner && self.index.contains_key(id))
    }

    /// Back-link edges, string leaves naming another node, and lists whose
    /// every item names another node. A list with any literal item stays a
    /// literal and links nothing.
    fn build_reverse_index(&mut self) {
        let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
        let mut link = |target: &str, referrer: &str| {
            let referrers = reverse.entry(target.to_string()).or_default();
            if !referrers.iter().any(|r| r == referrer) {
                referrers.push(referrer.to_string());
            }
        };

        for node in &self.nodes {
            let owner = node.identifier.as_str();
            for (_, target) in node.edges() {
                link(target, owner);
            }
            for (_, leaf) in flatten_attributes(&node.attributes) {
                match leaf {
                    AttrValue::Scalar(s) => {
                        if let Some(id) = s.as_str().filter(|_| self.names_other_node(leaf, owner)) {
                            link(id, owner);
                        }
                    }
                    AttrValue::List(items) => {
                        if items.iter().all(|item| self.names_other_node(item, owner)) {
                            for id in items.iter().filter_map(AttrValue::as_str) {
                                link(id, owner);
                            }
                        }
                    }
                    AttrValue::Map(_) => {}
                }
            }
        }
        self.reverse = reverse;
    }
}

/// Compose documents, in load order, into one graph.
///
/// Fails without a partial graph if any document declares an unsupported
/// version.
pub fn compose(documents: &[IfcxDocument]) -> Result<ComposedGraph> {
    for document in documents {
        document.check_version()?;
    }

    let mut graph = ComposedGraph::default();
    let mut fragments = 0usize;
    for document in documents {
        for raw in &document.data {
            graph.get_or_insert(&raw.identifier).merge(raw);
            fragments += 1;
        }
    }

    graph.close_edges();
    graph.assign_names();
    graph.repair_orphans();
    graph.build_reverse_index();

    info!(
        documents = documents.len(),
        fragments,
        nodes = graph.len(),
        stubs = graph.diagnostics.synthesized_stubs,
        repaired = graph.diagnostics.malformed_fragments,
        "composed IFCX graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifcgraph_model::Scalar;

    fn doc(body: &str) -> IfcxDocument {
        IfcxDocument::parse(
            "test",
            &format!(r#"{{"header":{{"version":"ifcx_alpha"}},"data":{body}}}"#),
        )
        .unwrap()
    }

    #[test]
    fn merges_by_identifier_last_write_wins() {
        let graph = compose(&[
            doc(r#"[{"identifier":"a","attributes":{"x":1,"y":2}}]"#),
            doc(r#"[{"path":"a","attributes":{"x":3,"z":4}}]"#),
        ])
        .unwrap();
        assert_eq!(graph.len(), 1);
        let a = graph.get("a").unwrap();
        let keys: Vec<&str> = a.attributes.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        assert_eq!(a.attributes.get("x"), Some(&AttrValue::Scalar(Scalar::Int(3))));
    }

    #[test]
    fn null_edge_removes_earlier_edge() {
        let graph = compose(&[
            doc(r#"[{"identifier":"a","children":{"k":"b"}},{"identifier":"b"}]"#),
            doc(r#"[{"identifier":"a","children":{"k":null}}]"#),
        ])
        .unwrap();
        assert!(graph.get("a").unwrap().children.is_empty());
        assert_eq!(graph.get("b").unwrap().name(), ROOT_NAME);
    }

    #[test]
    fn dangling_targets_become_named_stubs() {
        let graph = compose(&[doc(r#"[{"identifier":"a","children":{"Door":"d1"}}]"#)]).unwrap();
        let stub = graph.get("d1").unwrap();
        assert_eq!(stub.name(), "Door");
        assert!(stub.attributes.is_empty());
        assert_eq!(graph.diagnostics().synthesized_stubs, 1);
        assert_eq!(graph.referrers("d1"), &["a".to_string()]);
    }

    #[test]
    fn inherits_name_wins_over_children_name() {
        let graph = compose(&[doc(
            r#"[{"identifier":"p","children":{"Child":"t"},"inherits":{"Type":"t"}},{"identifier":"t"}]"#,
        )])
        .unwrap();
        assert_eq!(graph.get("t").unwrap().name(), "Type");
        assert_eq!(graph.roots().map(|r| r.identifier.as_str()).collect::<Vec<_>>(), vec!["p"]);
    }

    #[test]
    fn orphan_placeholder_is_folded_into_target() {
        let graph = compose(&[doc(
            r#"[
                {"identifier":"n1","children":{"X":"n2"}},
                {"identifier":"n2","attributes":{"keep":"target"}},
                {"identifier":"n1/X","attributes":{"keep":"stray","extra":true}}
            ]"#,
        )])
        .unwrap();
        assert!(graph.get("n1/X").is_none());
        let n2 = graph.get("n2").unwrap();
        assert_eq!(n2.attributes.get("keep").and_then(AttrValue::as_str), Some("target"));
        assert!(n2.attributes.contains_key("extra"));
        assert_eq!(graph.diagnostics().malformed_fragments, 1);
        // the index still resolves every node after removal
        for node in graph.iter() {
            assert_eq!(graph.get(&node.identifier), Some(node));
        }
    }

    #[test]
    fn linked_placeholder_is_left_alone() {
        let graph = compose(&[doc(
            r#"[
                {"identifier":"n1","children":{"X":"n2","Y":"n1/X"}},
                {"identifier":"n2"},
                {"identifier":"n1/X"}
            ]"#,
        )])
        .unwrap();
        assert!(graph.contains("n1/X"));
        assert_eq!(graph.diagnostics().malformed_fragments, 0);
    }

    #[test]
    fn attribute_strings_naming_nodes_are_back_linked() {
        let graph = compose(&[doc(
            r#"[
                {"identifier":"a","attributes":{"rel":{"target":"b"},"many":["b","c"]}},
                {"identifier":"b"},
                {"identifier":"c"}
            ]"#,
        )])
        .unwrap();
        assert_eq!(graph.referrers("b"), &["a".to_string()]);
        assert_eq!(graph.referrers("c"), &["a".to_string()]);
    }

    #[test]
    fn lists_with_literal_items_are_not_back_linked() {
        let graph = compose(&[doc(
            r#"[
                {"identifier":"a","attributes":{"mixed":["b","text"],"with_null":["c",null]}},
                {"identifier":"b","attributes":{"me":"b","us":["b","c"]}},
                {"identifier":"c"}
            ]"#,
        )])
        .unwrap();
        assert!(graph.referrers("b").is_empty());
        // "us" names b itself, so it is a literal tuple on b
        assert!(graph.referrers("c").is_empty());
    }

    #[test]
    fn bad_version_yields_no_graph() {
        let mut bad = doc("[]");
        bad.header.version = Some("ifc4".into());
        assert!(compose(&[doc(r#"[{"identifier":"a"}]"#), bad]).is_err());
    }
}
