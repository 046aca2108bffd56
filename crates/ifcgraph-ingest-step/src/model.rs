//! Flat-table source model
//!
//! An in-memory view over one parsed STEP file: entities in file order plus
//! the id, type, GUID and reverse-reference indexes the normalizer needs.
//! All indexes are built once at load; the model is read-only afterwards.

use crate::parser::{parse_step, StepEntity, StepHeader, StepValue};
use crate::schema::{InverseDef, Schema};
use ifcgraph_model::{GraphError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Length of an IFC `GlobalId` (compressed GUID).
pub const GLOBAL_ID_LEN: usize = 22;

const ROOT_TYPE: &str = "IfcRoot";

/// Whether `entity` starts with the `IfcRoot` prefix (GlobalId, OwnerHistory,
/// Name, Description). Keywords the schema does not cover qualify when they
/// are `IFC*` and argument 0 is a GlobalId-shaped string.
fn is_rooted(schema: &Schema, entity: &StepEntity) -> bool {
    if schema.contains(&entity.keyword) {
        return schema.is_subtype_of(&entity.keyword, ROOT_TYPE);
    }
    entity
        .keyword
        .get(..3)
        .is_some_and(|p| p.eq_ignore_ascii_case("IFC"))
        && entity
            .args
            .first()
            .and_then(StepValue::as_str)
            .is_some_and(|guid| guid.len() == GLOBAL_ID_LEN)
}

/// Ordered `(name, value)` view of an entity, `id` and `type` split out.
#[derive(Debug, Clone)]
pub struct EntityInfo<'m> {
    pub id: u64,
    pub type_name: &'m str,
    pub attributes: Vec<(Cow<'static, str>, &'m StepValue)>,
}

#[derive(Debug)]
pub struct StepModel {
    header: StepHeader,
    schema: &'static Schema,
    entities: Vec<StepEntity>,
    by_id: HashMap<u64, usize>,
    by_keyword: HashMap<String, Vec<usize>>,
    by_guid: HashMap<String, usize>,
    /// referenced id -> ids of the entities referencing it, ascending
    referrers: HashMap<u64, Vec<u64>>,
}

impl StepModel {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let model = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            entities = model.entities.len(),
            "loaded STEP model"
        );
        Ok(model)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let file = parse_step(text)?;
        Ok(Self::from_entities(file.header, file.entities))
    }

    pub fn from_entities(header: StepHeader, entities: Vec<StepEntity>) -> Self {
        let schema = Schema::builtin();
        let mut by_id = HashMap::with_capacity(entities.len());
        let mut by_keyword: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_guid = HashMap::new();
        let mut referrers: HashMap<u64, Vec<u64>> = HashMap::new();

        for (idx, entity) in entities.iter().enumerate() {
            by_id.insert(entity.id, idx);
            by_keyword
                .entry(entity.keyword.to_ascii_uppercase())
                .or_default()
                .push(idx);

            if is_rooted(schema, entity) {
                if let Some(guid) = entity.args.first().and_then(StepValue::as_str) {
                    by_guid.entry(guid.to_string()).or_insert(idx);
                }
            }

            let mut targets = Vec::new();
            for arg in &entity.args {
                arg.references(&mut targets);
            }
            targets.sort_unstable();
            targets.dedup();
            for target in targets {
                referrers.entry(target).or_default().push(entity.id);
            }
        }

        for ids in referrers.values_mut() {
            ids.sort_unstable();
        }

        Self {
            header,
            schema,
            entities,
            by_id,
            by_keyword,
            by_guid,
            referrers,
        }
    }

    pub fn header(&self) -> &StepHeader {
        &self.header
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in file order.
    pub fn iter(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.iter()
    }

    pub fn by_id(&self, id: u64) -> Result<&StepEntity> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.entities[idx])
            .ok_or_else(|| GraphError::not_found(format!("entity #{id}")))
    }

    /// Entities of `type_name` or any of its subtypes, in file order.
    ///
    /// A type the schema does not know and the file does not use is an
    /// error; a known type with no instances is an empty result.
    pub fn by_type(&self, type_name: &str) -> Result<Vec<&StepEntity>> {
        let upper = type_name.to_ascii_uppercase();
        if !self.schema.contains(&upper) && !self.by_keyword.contains_key(&upper) {
            return Err(GraphError::not_found(format!("entity type {type_name}")));
        }

        let mut indexes: Vec<usize> = self
            .by_keyword
            .iter()
            .filter(|(keyword, _)| self.schema.is_subtype_of(keyword, &upper))
            .flat_map(|(_, idxs)| idxs.iter().copied())
            .collect();
        indexes.sort_unstable();
        Ok(indexes.into_iter().map(|idx| &self.entities[idx]).collect())
    }

    pub fn by_guid(&self, guid: &str) -> Result<&StepEntity> {
        self.by_guid
            .get(guid)
            .map(|&idx| &self.entities[idx])
            .ok_or_else(|| GraphError::not_found(format!("GlobalId {guid}")))
    }

    /// Declared type name (`IfcWall`), or the raw keyword for types the
    /// schema does not cover.
    pub fn type_name<'e>(&self, entity: &'e StepEntity) -> &'e str {
        self.schema.canonical_name(&entity.keyword)
    }

    /// Forward attributes paired with their schema names. Arguments beyond
    /// the known layout are named `Attribute<N>`.
    pub fn info<'m>(&self, entity: &'m StepEntity) -> EntityInfo<'m> {
        let names = self.attribute_names(entity);
        let attributes = entity
            .args
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let name: Cow<'static, str> = match names.get(i) {
                    Some(n) => Cow::Borrowed(*n),
                    None => Cow::Owned(format!("Attribute{i}")),
                };
                (name, value)
            })
            .collect();
        EntityInfo {
            id: entity.id,
            type_name: self.type_name(entity),
            attributes,
        }
    }

    /// Schema attribute names, or the `IfcRoot` prefix for rooted types the
    /// schema does not cover.
    fn attribute_names(&self, entity: &StepEntity) -> Vec<&'static str> {
        if !self.schema.contains(&entity.keyword) && is_rooted(self.schema, entity) {
            return self.schema.attribute_names(ROOT_TYPE);
        }
        self.schema.attribute_names(&entity.keyword)
    }

    /// Value of a named forward attribute, if the entity has it.
    pub fn attribute<'e>(&self, entity: &'e StepEntity, name: &str) -> Option<&'e StepValue> {
        self.attribute_names(entity)
            .iter()
            .position(|a| *a == name)
            .and_then(|pos| entity.args.get(pos))
    }

    pub fn global_id<'e>(&self, entity: &'e StepEntity) -> Option<&'e str> {
        self.attribute(entity, "GlobalId").and_then(StepValue::as_str)
    }

    pub fn name<'e>(&self, entity: &'e StepEntity) -> Option<&'e str> {
        self.attribute(entity, "Name").and_then(StepValue::as_str)
    }

    pub fn inverse_attribute_names(&self, entity: &StepEntity) -> Vec<&'static str> {
        self.schema
            .inverse_attributes(&entity.keyword)
            .into_iter()
            .map(|i| i.name)
            .collect()
    }

    /// Entities linking to `entity` through the named inverse relationship,
    /// ascending by id.
    pub fn inverse_attribute(&self, entity: &StepEntity, name: &str) -> Result<Vec<&StepEntity>> {
        let def = self
            .schema
            .inverse_attributes(&entity.keyword)
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| {
                GraphError::not_found(format!(
                    "inverse attribute {name} on {}",
                    self.type_name(entity)
                ))
            })?;

        let mut out = Vec::new();
        for referrer in self.inverse_of(entity) {
            if self.holds_inverse_link(referrer, &def, entity.id) {
                out.push(referrer);
            }
        }
        Ok(out)
    }

    fn holds_inverse_link(&self, referrer: &StepEntity, def: &InverseDef, target: u64) -> bool {
        self.schema.is_subtype_of(&referrer.keyword, def.relating_type)
            && self
                .attribute(referrer, def.relating_attribute)
                .is_some_and(|v| v.refers_to(target))
    }

    /// Every entity holding a reference to `entity`, ascending by id.
    pub fn inverse_of(&self, entity: &StepEntity) -> Vec<&StepEntity> {
        self.referrers
            .get(&entity.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id).map(|&idx| &self.entities[idx]))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('house.ifc','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'House',$,$,$,$,$,$);
#2=IFCSITE('1YvctVUKr0kugbFTf53O9L',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCRELAGGREGATES('2YvctVUKr0kugbFTf53O9L',$,$,$,#1,(#2));
#4=IFCWALL('3YvctVUKr0kugbFTf53O9L',$,'Wall A',$,$,$,$,$,$);
#5=IFCWALLSTANDARDCASE('4YvctVUKr0kugbFTf53O9L',$,'Wall B',$,$,$,$,$,$);
#6=IFCRELCONTAINEDINSPATIALSTRUCTURE('5YvctVUKr0kugbFTf53O9L',$,$,$,(#4,#5),#2);
ENDSEC;
END-ISO-10303-21;"#;

    fn model() -> StepModel {
        StepModel::parse(MODEL).unwrap()
    }

    #[test]
    fn by_id_and_missing_id() {
        let m = model();
        assert_eq!(m.by_id(4).unwrap().keyword, "IFCWALL");
        assert!(m.by_id(99).unwrap_err().is_not_found());
    }

    #[test]
    fn by_type_includes_subtypes_in_file_order() {
        let m = model();
        let walls: Vec<u64> = m.by_type("IfcWall").unwrap().iter().map(|e| e.id).collect();
        assert_eq!(walls, vec![4, 5]);
        assert!(m.by_type("IfcDoor").unwrap().is_empty());
        assert!(m.by_type("IfcNoSuchThing").unwrap_err().is_not_found());
    }

    #[test]
    fn by_guid_finds_rooted_entities() {
        let m = model();
        assert_eq!(m.by_guid("3YvctVUKr0kugbFTf53O9L").unwrap().id, 4);
        assert!(m.by_guid("nope").is_err());
    }

    #[test]
    fn rooted_types_outside_the_schema_keep_guid_and_name() {
        let text = MODEL.replace(
            "ENDSEC;\nEND-ISO",
            "#7=IFCMEMBER('6YvctVUKr0kugbFTf53O9L',$,'Mullion',$,$,$,$,$,.MULLION.);\n\
             #8=IFCCUSTOMTHING('short',$,'NotRooted');\nENDSEC;\nEND-ISO",
        );
        let m = StepModel::parse(&text).unwrap();
        let member = m.by_guid("6YvctVUKr0kugbFTf53O9L").unwrap();
        assert_eq!(member.id, 7);
        assert_eq!(m.name(member), Some("Mullion"));

        let info = m.info(member);
        assert_eq!(info.type_name, "IFCMEMBER");
        assert_eq!(info.attributes[0].0, "GlobalId");
        assert_eq!(info.attributes[2].0, "Name");
        assert_eq!(info.attributes[8].0, "Attribute8");

        let other = m.by_id(8).unwrap();
        assert!(m.by_guid("short").is_err());
        assert_eq!(m.global_id(other), None);
        assert_eq!(m.info(other).attributes[2].0, "Attribute2");
    }

    #[test]
    fn info_names_attributes() {
        let m = model();
        let wall = m.by_id(4).unwrap();
        let info = m.info(wall);
        assert_eq!(info.id, 4);
        assert_eq!(info.type_name, "IfcWall");
        assert_eq!(info.attributes[0].0, "GlobalId");
        assert_eq!(info.attributes[2].1.as_str(), Some("Wall A"));
        assert_eq!(info.attributes.len(), 9);
    }

    #[test]
    fn inverse_attribute_filters_by_relationship() {
        let m = model();
        let site = m.by_id(2).unwrap();
        let decomposes: Vec<u64> = m
            .inverse_attribute(site, "Decomposes")
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(decomposes, vec![3]);

        let contains: Vec<u64> = m
            .inverse_attribute(site, "ContainsElements")
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(contains, vec![6]);

        assert!(m.inverse_attribute(site, "IsDecomposedBy").unwrap().is_empty());
        assert!(m.inverse_attribute(site, "Bogus").unwrap_err().is_not_found());
    }

    #[test]
    fn inverse_of_lists_all_referrers() {
        let m = model();
        let site = m.by_id(2).unwrap();
        let ids: Vec<u64> = m.inverse_of(site).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 6]);
    }

    #[test]
    fn parse_error_maps_to_graph_error() {
        let err = StepModel::parse("ISO-10303-21;\nDATA;\n#1=;\nENDSEC;").unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 3, .. }));
    }
}
