//! Facade dispatch over the two backends.

use crate::kind::DocumentKind;
use ifcgraph_ingest_ifcx::IfcxAccessor;
use ifcgraph_ingest_step::StepAccessor;
use ifcgraph_model::{Accessor, GraphError, Node, NodeId, Result, SearchIndex, SearchItem};

#[derive(Debug, Clone)]
pub enum Backend<'s> {
    Step(StepAccessor<'s>),
    Ifcx(IfcxAccessor<'s>),
}

impl Backend<'_> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Backend::Step(_) => DocumentKind::Step,
            Backend::Ifcx(_) => DocumentKind::Ifcx,
        }
    }

    /// Type and search entry of one node.
    pub fn search_item_by_id(&self, id: &NodeId) -> Result<(String, SearchItem)> {
        match self {
            Backend::Step(step) => {
                let entity = id
                    .as_entity()
                    .ok_or_else(|| GraphError::not_found(format!("entity {id}")))?;
                step.search_item_by_id(entity)
            }
            Backend::Ifcx(ifcx) => ifcx.search_item_by_id(id),
        }
    }

    /// Lookup by `GlobalId`. Graph documents carry no GUIDs.
    pub fn search_item_by_guid(&self, guid: &str) -> Result<(String, SearchItem)> {
        match self {
            Backend::Step(step) => step.search_item_by_guid(guid),
            Backend::Ifcx(_) => Err(GraphError::not_found(format!("GlobalId {guid}"))),
        }
    }
}

impl Accessor for Backend<'_> {
    fn get_root(&self) -> Result<Node> {
        match self {
            Backend::Step(step) => step.get_root(),
            Backend::Ifcx(ifcx) => ifcx.get_root(),
        }
    }

    fn get_by_id(&self, id: &NodeId) -> Result<Node> {
        match self {
            Backend::Step(step) => step.get_by_id(id),
            Backend::Ifcx(ifcx) => ifcx.get_by_id(id),
        }
    }

    fn search_index(&self) -> Result<SearchIndex> {
        match self {
            Backend::Step(step) => step.search_index(),
            Backend::Ifcx(ifcx) => ifcx.search_index(),
        }
    }
}
