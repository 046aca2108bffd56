//! Reference classifier
//!
//! Decides whether a raw backend value is a literal or a link to another
//! node. Both backends route every attribute value through [`classify`], so
//! a STEP `#12` and an IFCX identifier string end up as the same
//! [`Content::Reference`] shape.
//!
//! Rules:
//! - a handle with identity becomes `Reference(id)`;
//! - a handle without identity (an inline typed primitive such as
//!   `IFCLABEL('x')`) unwraps to `Value(inner)`;
//! - a sequence of identity handles becomes one `Reference` per item, while
//!   a sequence containing any literal becomes one opaque `Value(Tuple)`;
//! - null yields no contents at all.

use crate::node::{Content, NodeId, Scalar};

/// A link to another entity or fragment as seen by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    /// `None` for degenerate wrappers that carry no real identity.
    pub id: Option<NodeId>,
    /// Wrapped primitive of a degenerate handle.
    pub inner: Option<Scalar>,
}

impl Handle {
    pub fn to(id: NodeId) -> Self {
        Self {
            id: Some(id),
            inner: None,
        }
    }

    pub fn wrapping(inner: Scalar) -> Self {
        Self {
            id: None,
            inner: Some(inner),
        }
    }
}

/// Classifier view of a raw value.
#[derive(Debug, Clone)]
pub enum ValueShape<V> {
    Null,
    Scalar(Scalar),
    Handle(Handle),
    Sequence(Vec<V>),
}

/// Implemented by each backend's raw value type.
pub trait SourceValue: Sized {
    fn shape(&self) -> ValueShape<Self>;
}

/// Classify a raw value into attribute contents.
pub fn classify<V: SourceValue>(value: &V) -> Vec<Content> {
    match value.shape() {
        ValueShape::Null => Vec::new(),
        ValueShape::Scalar(s) => vec![Content::Value(s)],
        ValueShape::Handle(h) => vec![handle_content(h)],
        ValueShape::Sequence(items) => classify_sequence(&items),
    }
}

fn handle_content(handle: Handle) -> Content {
    match handle.id {
        Some(id) => Content::Reference(id),
        None => Content::Value(handle.inner.unwrap_or(Scalar::Null)),
    }
}

fn classify_sequence<V: SourceValue>(items: &[V]) -> Vec<Content> {
    let shapes: Vec<ValueShape<V>> = items.iter().map(SourceValue::shape).collect();

    let all_references = shapes
        .iter()
        .all(|s| matches!(s, ValueShape::Handle(Handle { id: Some(_), .. })));

    if all_references {
        return shapes
            .into_iter()
            .filter_map(|s| match s {
                ValueShape::Handle(Handle { id: Some(id), .. }) => Some(Content::Reference(id)),
                _ => None,
            })
            .collect();
    }

    vec![Content::Value(Scalar::Tuple(
        shapes.into_iter().map(shape_to_scalar).collect(),
    ))]
}

/// Collapse a shape into a literal, used once a sequence is known to be a
/// composite scalar.
fn shape_to_scalar<V: SourceValue>(shape: ValueShape<V>) -> Scalar {
    match shape {
        ValueShape::Null => Scalar::Null,
        ValueShape::Scalar(s) => s,
        ValueShape::Handle(Handle { id: Some(id), .. }) => match id {
            NodeId::Entity(n) => Scalar::Str(format!("#{n}")),
            NodeId::Path(p) => Scalar::Str(p),
        },
        ValueShape::Handle(Handle { id: None, inner }) => inner.unwrap_or(Scalar::Null),
        ValueShape::Sequence(items) => Scalar::Tuple(
            items
                .iter()
                .map(|item| shape_to_scalar(item.shape()))
                .collect(),
        ),
    }
}
