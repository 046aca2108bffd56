//! Backend-agnostic read facade.

use crate::error::Result;
use crate::node::{Node, NodeId};
use crate::search::SearchIndex;

/// Read operations every backend exposes to the inspection UI.
///
/// Lookups that miss return [`crate::GraphError::NotFound`]; no
/// implementation substitutes an empty node.
pub trait Accessor {
    /// The entry node of the loaded model.
    fn get_root(&self) -> Result<Node>;

    fn get_by_id(&self, id: &NodeId) -> Result<Node>;

    /// Type-bucketed listing of every node, items sorted by id.
    fn search_index(&self) -> Result<SearchIndex>;
}
