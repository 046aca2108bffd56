//! Composed graph node -> canonical [`Node`].

use crate::compose::{ComposedGraph, Fragment};
use crate::value::{flatten_attributes, AttrValue, OrderedMap, PATH_SEPARATOR};
use ifcgraph_model::{
    classify, Attribute, Content, Handle, Node, NodeId, Scalar, SourceValue, ValueShape,
};
use std::collections::HashSet;

/// An attribute value seen from one node of a composed graph. Strings naming
/// another node of the same graph are handles; everything else is literal.
#[derive(Clone, Copy)]
struct GraphValue<'g> {
    value: &'g AttrValue,
    graph: &'g ComposedGraph,
    owner: &'g str,
}

impl<'g> GraphValue<'g> {
    fn at(&self, value: &'g AttrValue) -> Self {
        Self { value, ..*self }
    }
}

impl SourceValue for GraphValue<'_> {
    fn shape(&self) -> ValueShape<Self> {
        match self.value {
            AttrValue::Scalar(Scalar::Null) => ValueShape::Null,
            AttrValue::Scalar(Scalar::Str(s)) if s != self.owner && self.graph.contains(s) => {
                ValueShape::Handle(Handle::to(NodeId::Path(s.clone())))
            }
            AttrValue::Scalar(s) => ValueShape::Scalar(s.clone()),
            AttrValue::List(items) => ValueShape::Sequence(items.iter().map(|v| self.at(v)).collect()),
            // nested objects inside lists are not flattened; keep them as JSON text
            map @ AttrValue::Map(_) => ValueShape::Scalar(Scalar::Str(map.to_json().to_string())),
        }
    }
}

fn edge_attribute(name: &str, edges: &OrderedMap<String>) -> Option<Attribute> {
    if edges.is_empty() {
        return None;
    }
    let contents = edges
        .values()
        .map(|target| Content::Reference(NodeId::Path(target.clone())))
        .collect();
    Some(Attribute::forward(name, contents))
}

const EDGE_NAMES: [&str; 2] = ["children", "inherits"];

/// Prefix for fragment attributes whose path matches an edge attribute name.
const ATTRIBUTES_PREFIX: &str = "attributes";

/// Attribute name for a flattened path, unique among `taken`.
///
/// A path already used by an edge attribute is moved under
/// [`ATTRIBUTES_PREFIX`]; a path that still collides (two spellings of the
/// same nested key) gets a `~2`, `~3`, ... suffix.
fn unique_name(path: String, taken: &mut HashSet<String>) -> String {
    let base = if EDGE_NAMES.contains(&path.as_str()) {
        format!("{ATTRIBUTES_PREFIX}{PATH_SEPARATOR}{path}")
    } else {
        path
    };
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{base}~{n}");
        n += 1;
    }
    name
}

pub fn normalize_node(graph: &ComposedGraph, fragment: &Fragment) -> Node {
    let mut node = Node::new(NodeId::Path(fragment.identifier.clone()), fragment.name());

    let [children, inherits] = EDGE_NAMES;
    node.attributes
        .extend(edge_attribute(children, &fragment.children));
    node.attributes
        .extend(edge_attribute(inherits, &fragment.inherits));

    let mut taken: HashSet<String> = node.attributes.iter().map(|a| a.name.clone()).collect();
    for (path, leaf) in flatten_attributes(&fragment.attributes) {
        let value = GraphValue {
            value: leaf,
            graph,
            owner: &fragment.identifier,
        };
        let name = unique_name(path, &mut taken);
        node.attributes.push(Attribute::forward(name, classify(&value)));
    }

    node.references = Attribute::references(
        graph
            .referrers(&fragment.identifier)
            .iter()
            .map(|id| NodeId::Path(id.clone())),
    );
    node
}
