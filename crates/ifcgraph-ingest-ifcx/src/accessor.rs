//! [`Accessor`] over a composed IFCX graph.

use crate::compose::{ComposedGraph, Fragment};
use crate::normalize::normalize_node;
use ifcgraph_model::{
    display_name, Accessor, GraphError, Node, NodeId, Result, SearchIndex, SearchItem,
    DEFAULT_DISPLAY_SEPARATOR,
};

#[derive(Debug, Clone)]
pub struct IfcxAccessor<'g> {
    graph: &'g ComposedGraph,
    separator: String,
}

impl<'g> IfcxAccessor<'g> {
    pub fn new(graph: &'g ComposedGraph) -> Self {
        Self {
            graph,
            separator: DEFAULT_DISPLAY_SEPARATOR.to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn graph(&self) -> &'g ComposedGraph {
        self.graph
    }

    /// Graph nodes carry no GUID or human name; they display as their path.
    fn search_item(&self, fragment: &Fragment) -> SearchItem {
        let id = NodeId::Path(fragment.identifier.clone());
        SearchItem {
            display_name: display_name(&id, None, None, &self.separator),
            id,
        }
    }

    pub fn search_item_by_id(&self, id: &NodeId) -> Result<(String, SearchItem)> {
        let fragment = self.lookup(id)?;
        Ok((fragment.name().to_string(), self.search_item(fragment)))
    }

    /// Paths match literally. An entity number `n` (parsed from `n` or `#n`)
    /// matches the path `"n"`, then the path `"#n"`.
    fn lookup(&self, id: &NodeId) -> Result<&'g Fragment> {
        let found = match id {
            NodeId::Path(path) => self.graph.get(path),
            NodeId::Entity(n) => self
                .graph
                .get(&n.to_string())
                .or_else(|| self.graph.get(&format!("#{n}"))),
        };
        found.ok_or_else(|| GraphError::not_found(format!("node {id}")))
    }
}

impl Accessor for IfcxAccessor<'_> {
    /// First node, in arena order, named `root`. A node whose only incoming
    /// edge was removed by a `null` overlay counts.
    fn get_root(&self) -> Result<Node> {
        let root = self
            .graph
            .roots()
            .next()
            .ok_or_else(|| GraphError::not_found("root node"))?;
        Ok(normalize_node(self.graph, root))
    }

    fn get_by_id(&self, id: &NodeId) -> Result<Node> {
        Ok(normalize_node(self.graph, self.lookup(id)?))
    }

    fn search_index(&self) -> Result<SearchIndex> {
        let mut index = SearchIndex::new();
        for fragment in self.graph.iter() {
            index.push(fragment.name(), self.search_item(fragment));
        }
        Ok(index.sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;
    use crate::document::IfcxDocument;

    fn graph() -> ComposedGraph {
        let doc = IfcxDocument::parse(
            "test",
            r#"{"header":{"version":"ifcx_alpha"},"data":[
                {"identifier":"site","children":{"Building":"b1"}},
                {"identifier":"b1","children":{"Storey":"s1","Storey2":"s2"}},
                {"identifier":"s1"},
                {"identifier":"s2"}
            ]}"#,
        )
        .unwrap();
        compose(&[doc]).unwrap()
    }

    #[test]
    fn root_and_lookup() {
        let g = graph();
        let accessor = IfcxAccessor::new(&g);
        assert_eq!(accessor.get_root().unwrap().id, NodeId::Path("site".into()));
        assert_eq!(accessor.get_by_id(&"b1".into()).unwrap().node_type, "Building");
        assert!(accessor.get_by_id(&"zz".into()).unwrap_err().is_not_found());
    }

    #[test]
    fn numeric_ids_fall_back_to_paths() {
        let doc = IfcxDocument::parse(
            "test",
            r#"{"header":{"version":"ifcx_alpha"},"data":[{"identifier":"12"}]}"#,
        )
        .unwrap();
        let g = compose(&[doc]).unwrap();
        let accessor = IfcxAccessor::new(&g);
        assert_eq!(
            accessor.get_by_id(&NodeId::Entity(12)).unwrap().id,
            NodeId::Path("12".into())
        );
    }

    #[test]
    fn hash_prefixed_paths_are_reachable_from_entity_ids() {
        let doc = IfcxDocument::parse(
            "test",
            r##"{"header":{"version":"ifcx_alpha"},"data":[{"identifier":"#12"},{"identifier":"7"},{"identifier":"#7"}]}"##,
        )
        .unwrap();
        let g = compose(&[doc]).unwrap();
        let accessor = IfcxAccessor::new(&g);

        let id: NodeId = "#12".parse().unwrap();
        assert_eq!(accessor.get_by_id(&id).unwrap().id, NodeId::Path("#12".into()));
        let (_, item) = accessor.search_item_by_id(&id).unwrap();
        assert_eq!(item.display_name, "#12");
        // the bare spelling wins when both exist
        assert_eq!(accessor.get_by_id(&NodeId::Entity(7)).unwrap().id, NodeId::Path("7".into()));
        assert_eq!(
            accessor.get_by_id(&NodeId::Path("#7".into())).unwrap().id,
            NodeId::Path("#7".into())
        );
    }

    #[test]
    fn search_groups_by_name() {
        let g = graph();
        let index = IfcxAccessor::new(&g).search_index().unwrap();
        assert_eq!(index.types().collect::<Vec<_>>(), vec!["Building", "Storey", "Storey2", "root"]);
        let building = &index.bucket("Building").unwrap().items[0];
        assert_eq!(building.display_name, "b1");
    }

    #[test]
    fn root_after_null_overlay_is_named_root() {
        let base = IfcxDocument::parse(
            "base",
            r#"{"header":{"version":"ifcx_alpha"},"data":[
                {"identifier":"part"},
                {"identifier":"top","children":{"Part":"part"}}
            ]}"#,
        )
        .unwrap();
        let overlay = IfcxDocument::parse(
            "overlay",
            r#"{"header":{"version":"ifcx_alpha"},"data":[{"identifier":"top","children":{"Part":null}}]}"#,
        )
        .unwrap();
        let g = compose(&[base, overlay]).unwrap();
        // both nodes are now unreferenced; "part" comes first in the arena
        let root = IfcxAccessor::new(&g).get_root().unwrap();
        assert_eq!(root.id, NodeId::Path("part".into()));
        assert_eq!(root.node_type, "root");
    }

    #[test]
    fn empty_graph_has_no_root() {
        let g = compose(&[]).unwrap();
        assert!(IfcxAccessor::new(&g).get_root().unwrap_err().is_not_found());
    }
}
