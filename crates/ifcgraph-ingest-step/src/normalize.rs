//! Flat-table normalizer: one STEP entity -> canonical [`Node`].

use crate::model::StepModel;
use crate::parser::{StepEntity, StepValue};
use ifcgraph_model::{
    classify, Attribute, Content, Handle, Node, NodeId, Result, Scalar, SourceValue, ValueShape,
};
use std::collections::HashSet;

impl<'a> SourceValue for &'a StepValue {
    fn shape(&self) -> ValueShape<Self> {
        match *self {
            StepValue::Null | StepValue::Derived => ValueShape::Null,
            StepValue::Ref(id) => ValueShape::Handle(Handle::to(NodeId::Entity(*id))),
            StepValue::Typed(_, inner) => ValueShape::Handle(Handle::wrapping(to_scalar(inner))),
            StepValue::List(items) => ValueShape::Sequence(items.iter().collect()),
            other => ValueShape::Scalar(to_scalar(other)),
        }
    }
}

fn to_scalar(value: &StepValue) -> Scalar {
    match value {
        StepValue::Null | StepValue::Derived => Scalar::Null,
        StepValue::Bool(b) => Scalar::Bool(*b),
        StepValue::Int(n) => Scalar::Int(*n),
        StepValue::Real(n) => Scalar::Real(*n),
        StepValue::Str(s) | StepValue::Enum(s) | StepValue::Binary(s) => Scalar::Str(s.clone()),
        StepValue::Ref(id) => Scalar::Str(format!("#{id}")),
        StepValue::List(items) => Scalar::Tuple(items.iter().map(to_scalar).collect()),
        StepValue::Typed(_, inner) => to_scalar(inner),
    }
}

pub fn classify_value(value: &StepValue) -> Vec<Content> {
    classify(&value)
}

/// Build the canonical descriptor of `entity`.
///
/// Back-links already reported by a declared inverse attribute are left out
/// of `references`.
pub fn normalize_entity(model: &StepModel, entity: &StepEntity) -> Result<Node> {
    let info = model.info(entity);
    let mut node = Node::new(NodeId::Entity(info.id), info.type_name);

    for (name, value) in info.attributes {
        node.attributes
            .push(Attribute::forward(name.into_owned(), classify_value(value)));
    }

    let mut already_declared: HashSet<u64> = HashSet::new();
    for name in model.inverse_attribute_names(entity) {
        let linked = model.inverse_attribute(entity, name)?;
        already_declared.extend(linked.iter().map(|e| e.id));
        let value = StepValue::List(linked.iter().map(|e| StepValue::Ref(e.id)).collect());
        node.attributes
            .push(Attribute::inverse(name, classify_value(&value)));
    }

    node.references = Attribute::references(
        model
            .inverse_of(entity)
            .into_iter()
            .map(|e| e.id)
            .filter(|id| !already_declared.contains(id))
            .map(NodeId::Entity),
    );

    Ok(node)
}

/// Look an entity up by id and normalize it.
pub fn normalize_by_id(model: &StepModel, id: u64) -> Result<Node> {
    normalize_entity(model, model.by_id(id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_tuple_is_a_single_value() {
        let value = StepValue::List(vec![
            StepValue::Real(0.0),
            StepValue::Real(0.0),
            StepValue::Real(0.0),
        ]);
        assert_eq!(
            classify_value(&value),
            vec![Content::Value(Scalar::Tuple(vec![
                Scalar::Real(0.0),
                Scalar::Real(0.0),
                Scalar::Real(0.0),
            ]))]
        );
    }

    #[test]
    fn typed_value_unwraps() {
        let value = StepValue::Typed("IFCINTEGER".into(), Box::new(StepValue::Int(2)));
        assert_eq!(classify_value(&value), vec![Content::Value(Scalar::Int(2))]);
    }

    #[test]
    fn enums_become_strings_and_null_is_empty() {
        assert_eq!(
            classify_value(&StepValue::Enum("ELEMENT".into())),
            vec![Content::Value(Scalar::from("ELEMENT"))]
        );
        assert!(classify_value(&StepValue::Null).is_empty());
        assert!(classify_value(&StepValue::Derived).is_empty());
    }

    #[test]
    fn reference_list_yields_references() {
        let value = StepValue::List(vec![StepValue::Ref(4), StepValue::Ref(5)]);
        assert_eq!(
            classify_value(&value),
            vec![
                Content::Reference(NodeId::Entity(4)),
                Content::Reference(NodeId::Entity(5)),
            ]
        );
    }

    #[test]
    fn entity_without_links_normalizes_empty() {
        let model = StepModel::parse(
            "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCUNITASSIGNMENT(());\nENDSEC;\nEND-ISO-10303-21;",
        )
        .unwrap();
        let node = normalize_by_id(&model, 1).unwrap();
        assert_eq!(node.node_type, "IfcUnitAssignment");
        assert_eq!(node.attributes.len(), 1);
        assert!(node.attributes[0].contents.is_empty());
        assert!(node.references.contents.is_empty());
    }

    #[test]
    fn missing_entity_propagates_not_found() {
        let model = StepModel::parse("ISO-10303-21;\nDATA;\nENDSEC;").unwrap();
        assert!(normalize_by_id(&model, 7).unwrap_err().is_not_found());
    }
}
