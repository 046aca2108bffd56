//! End-to-end tests for the STEP backend: parse -> model -> normalize -> facade.

use ifcgraph_ingest_step::{normalize_entity, StepAccessor, StepModel, StepValue};
use ifcgraph_model::{Accessor, Content, GraphError, NodeId, Scalar};
use proptest::prelude::*;
use std::collections::HashSet;
use std::io::Write;

const HOUSE: &str = include_str!("../../../tests/data/house.ifc");

fn house() -> StepModel {
    StepModel::parse(HOUSE).expect("fixture parses")
}

fn ids(contents: &[Content]) -> Vec<NodeId> {
    contents.iter().filter_map(|c| c.reference().cloned()).collect()
}

#[test]
fn test_root_is_the_project() {
    let model = house();
    let root = StepAccessor::new(&model).get_root().unwrap();
    assert_eq!(root.id, NodeId::Entity(20));
    assert_eq!(root.node_type, "IfcProject");

    let name = root.attribute("Name").unwrap();
    assert_eq!(name.contents, vec![Content::Value(Scalar::from("Sample House"))]);
    assert!(!name.inverse);

    let decomposed = root.attribute("IsDecomposedBy").unwrap();
    assert!(decomposed.inverse);
    assert_eq!(ids(&decomposed.contents), vec![NodeId::Entity(30)]);
}

#[test]
fn test_declared_inverses_are_not_double_reported() {
    let model = house();
    let accessor = StepAccessor::new(&model);
    let wall = accessor.get_by_id(&NodeId::Entity(41)).unwrap();

    assert_eq!(
        ids(&wall.attribute("ContainedInStructure").unwrap().contents),
        vec![NodeId::Entity(44)]
    );
    assert_eq!(
        ids(&wall.attribute("IsDefinedBy").unwrap().contents),
        vec![NodeId::Entity(53)]
    );
    assert!(wall.references.contents.is_empty());
}

#[test]
fn test_undeclared_back_links_land_in_references() {
    let model = house();
    let accessor = StepAccessor::new(&model);

    let placement = accessor.get_by_id(&NodeId::Entity(21)).unwrap();
    assert_eq!(
        ids(&placement.attribute("PlacesObject").unwrap().contents),
        vec![NodeId::Entity(22)]
    );
    assert_eq!(ids(&placement.references.contents), vec![NodeId::Entity(23)]);

    let history = accessor.get_by_id(&NodeId::Entity(5)).unwrap();
    assert_eq!(history.references.contents.len(), 13);
    assert!(history.attributes.iter().all(|a| !a.inverse));
}

#[test]
fn test_no_double_reporting_for_every_entity() {
    let model = house();
    for entity in model.iter() {
        let node = normalize_entity(&model, entity).unwrap();
        let declared = node.declared_inverse_targets();
        for back in node.references.reference_targets() {
            assert!(
                !declared.contains(back),
                "{} reported {} twice",
                node.id,
                back
            );
        }
    }
}

#[test]
fn test_forward_value_shapes() {
    let model = house();
    let accessor = StepAccessor::new(&model);

    let origin = accessor.get_by_id(&NodeId::Entity(10)).unwrap();
    let coords = origin.attribute("Coordinates").unwrap();
    assert_eq!(coords.contents.len(), 1);
    assert!(matches!(&coords.contents[0], Content::Value(Scalar::Tuple(t)) if t.len() == 3));

    let prop = accessor.get_by_id(&NodeId::Entity(50)).unwrap();
    assert_eq!(
        prop.attribute("NominalValue").unwrap().contents,
        vec![Content::Value(Scalar::Bool(true))]
    );
    assert!(prop.attribute("Description").unwrap().contents.is_empty());

    let project = accessor.get_by_id(&NodeId::Entity(20)).unwrap();
    assert_eq!(
        ids(&project.attribute("RepresentationContexts").unwrap().contents),
        vec![NodeId::Entity(14)]
    );
}

#[test]
fn test_search_index_is_sorted_and_labelled() {
    let model = house();
    let accessor = StepAccessor::new(&model);
    let index = accessor.search_index().unwrap();
    assert_eq!(index.len(), model.len());

    let walls = &index.bucket("IfcWall").unwrap().items;
    assert_eq!(walls[0].id, NodeId::Entity(41));
    assert_eq!(walls[0].display_name, "#41 | 2O2Fr$t4X7Zf8NOew3FLOH | Wall North");

    let points = &index.bucket("IfcCartesianPoint").unwrap().items;
    assert_eq!(points[0].display_name, "#10");

    for (_, bucket) in index.iter() {
        let ids: Vec<_> = bucket.items.iter().map(|i| i.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
    assert_eq!(index, accessor.search_index().unwrap());
}

#[test]
fn test_lookup_by_id_and_guid() {
    let model = house();
    let accessor = StepAccessor::new(&model).with_separator(" / ");
    let (ty, item) = accessor.search_item_by_guid("0C87kaqBXF$xpGmTZ7zxN$").unwrap();
    assert_eq!(ty, "IfcBuildingStorey");
    assert_eq!(item.display_name, "#26 / 0C87kaqBXF$xpGmTZ7zxN$ / Ground Floor");

    let (ty, _) = accessor.search_item_by_id(43).unwrap();
    assert_eq!(ty, "IfcSlab");
    assert!(accessor.search_item_by_id(999).unwrap_err().is_not_found());
}

#[test]
fn test_rooted_types_outside_the_schema_are_labelled() {
    let model = StepModel::parse(
        "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n\
         #1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'P',$,$,$,$,$,$);\n\
         #2=IFCMEMBER('1YvctVUKr0kugbFTf53O9L',$,'Mullion',$,$,$,$,$,.MULLION.);\n\
         ENDSEC;\nEND-ISO-10303-21;",
    )
    .unwrap();
    let accessor = StepAccessor::new(&model);

    let (ty, item) = accessor.search_item_by_guid("1YvctVUKr0kugbFTf53O9L").unwrap();
    assert_eq!(ty, "IFCMEMBER");
    assert_eq!(item.display_name, "#2 | 1YvctVUKr0kugbFTf53O9L | Mullion");
    let (_, item) = accessor.search_item_by_id(2).unwrap();
    assert_eq!(item.display_name, "#2 | 1YvctVUKr0kugbFTf53O9L | Mullion");

    let member = accessor.get_by_id(&NodeId::Entity(2)).unwrap();
    assert_eq!(
        member.attribute("Name").unwrap().contents,
        vec![Content::Value(Scalar::from("Mullion"))]
    );
}

#[test]
fn test_missing_ids_fail() {
    let model = house();
    let accessor = StepAccessor::new(&model);
    assert!(accessor.get_by_id(&NodeId::Entity(9999)).unwrap_err().is_not_found());
    assert!(accessor
        .get_by_id(&NodeId::Path("not-an-entity".into()))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_missing_root_type_fails() {
    let model = StepModel::parse(
        "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCCARTESIANPOINT((0.,0.));\nENDSEC;\nEND-ISO-10303-21;",
    )
    .unwrap();
    let err = StepAccessor::new(&model).get_root().unwrap_err();
    assert!(matches!(err, GraphError::NotFound(_)));

    let custom = StepAccessor::new(&model).with_root_type("IfcCartesianPoint");
    assert_eq!(custom.get_root().unwrap().id, NodeId::Entity(1));
}

#[test]
fn test_open_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(HOUSE.as_bytes()).unwrap();
    let model = StepModel::open(file.path()).unwrap();
    assert_eq!(model.header().file_schema, vec!["IFC4".to_string()]);
    assert_eq!(model.by_type("IfcSpatialStructureElement").unwrap().len(), 3);
}

// ============================================================================
// Property: no double reporting on arbitrary containment tables
// ============================================================================

fn step_text(walls: usize, containment: &[(usize, Vec<usize>)]) -> String {
    let mut out = String::from("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n");
    out.push_str("#1=IFCBUILDINGSTOREY('g1',$,'S',$,$,$,$,$,.ELEMENT.,0.);\n");
    for w in 0..walls {
        out.push_str(&format!("#{}=IFCWALL('w{w}',$,$,$,$,$,$,$,$);\n", 10 + w));
    }
    for (i, (extra, members)) in containment.iter().enumerate() {
        let list: Vec<String> = members.iter().map(|m| format!("#{}", 10 + m)).collect();
        out.push_str(&format!(
            "#{}=IFCRELCONTAINEDINSPATIALSTRUCTURE('r{i}',$,$,$,({}),#1);\n",
            1000 + i,
            list.join(",")
        ));
        // a proxy pointing at the same walls through a non-inverse slot
        out.push_str(&format!(
            "#{}=IFCBUILDINGELEMENTPROXY('p{i}',$,$,$,$,$,$,$,$,#{});\n",
            2000 + i,
            10 + extra
        ));
    }
    out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
    out
}

fn table_strategy() -> impl Strategy<Value = (usize, Vec<(usize, Vec<usize>)>)> {
    (1usize..6).prop_flat_map(|walls| {
        let rel = (0..walls, prop::collection::vec(0..walls, 1..4));
        (Just(walls), prop::collection::vec(rel, 0..5))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_references_never_repeat_declared_inverses((walls, rels) in table_strategy()) {
        let model = StepModel::parse(&step_text(walls, &rels)).unwrap();
        for entity in model.iter() {
            let node = normalize_entity(&model, entity).unwrap();
            let declared = node.declared_inverse_targets();
            let refs: HashSet<_> = node.references.reference_targets().collect();
            prop_assert!(refs.is_disjoint(&declared));

            // every back-link is reported exactly once across both places
            let all: HashSet<u64> = model.inverse_of(entity).iter().map(|e| e.id).collect();
            let seen: HashSet<u64> = declared
                .iter()
                .chain(refs.iter())
                .filter_map(|id| id.as_entity())
                .collect();
            prop_assert_eq!(all, seen);
        }
    }
}

#[test]
fn test_raw_values_survive_parsing() {
    let model = house();
    let unit = model.by_id(15).unwrap();
    assert_eq!(unit.args[0], StepValue::Derived);
    assert_eq!(unit.args[1], StepValue::Enum("LENGTHUNIT".into()));
}
