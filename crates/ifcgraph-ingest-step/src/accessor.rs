//! [`Accessor`] over a loaded STEP model.

use crate::model::StepModel;
use crate::normalize::normalize_entity;
use crate::parser::StepEntity;
use ifcgraph_model::{
    display_name, Accessor, GraphError, Node, NodeId, Result, SearchIndex, SearchItem,
    DEFAULT_DISPLAY_SEPARATOR,
};

pub const DEFAULT_ROOT_TYPE: &str = "IfcProject";

#[derive(Debug, Clone)]
pub struct StepAccessor<'m> {
    model: &'m StepModel,
    root_type: String,
    separator: String,
}

impl<'m> StepAccessor<'m> {
    pub fn new(model: &'m StepModel) -> Self {
        Self {
            model,
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            separator: DEFAULT_DISPLAY_SEPARATOR.to_string(),
        }
    }

    pub fn with_root_type(mut self, root_type: impl Into<String>) -> Self {
        self.root_type = root_type.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn model(&self) -> &'m StepModel {
        self.model
    }

    fn search_item(&self, entity: &StepEntity) -> SearchItem {
        let guid = self.model.global_id(entity);
        let name = self.model.name(entity);
        let id = NodeId::Entity(entity.id);
        SearchItem {
            display_name: display_name(&id, guid, name, &self.separator),
            id,
        }
    }

    /// Type and search entry of a single entity.
    pub fn search_item_by_id(&self, id: u64) -> Result<(String, SearchItem)> {
        let entity = self.model.by_id(id)?;
        Ok((
            self.model.type_name(entity).to_string(),
            self.search_item(entity),
        ))
    }

    pub fn search_item_by_guid(&self, guid: &str) -> Result<(String, SearchItem)> {
        let entity = self.model.by_guid(guid)?;
        Ok((
            self.model.type_name(entity).to_string(),
            self.search_item(entity),
        ))
    }
}

impl Accessor for StepAccessor<'_> {
    fn get_root(&self) -> Result<Node> {
        let root = self
            .model
            .by_type(&self.root_type)?
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::not_found(format!("root entity of type {}", self.root_type)))?;
        normalize_entity(self.model, root)
    }

    fn get_by_id(&self, id: &NodeId) -> Result<Node> {
        let entity_id = id
            .as_entity()
            .ok_or_else(|| GraphError::not_found(format!("entity {id}")))?;
        normalize_entity(self.model, self.model.by_id(entity_id)?)
    }

    fn search_index(&self) -> Result<SearchIndex> {
        let mut index = SearchIndex::new();
        for entity in self.model.iter() {
            index.push(self.model.type_name(entity), self.search_item(entity));
        }
        Ok(index.sorted())
    }
}
