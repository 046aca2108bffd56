//! IFCX ingestion for the inspection graph
//!
//! IFCX documents describe a scene graph as loose fragments: the same
//! identifier may appear many times across many documents, each time adding
//! children, inherits edges or attributes. This crate:
//! - loads documents and checks their declared version (`document`)
//! - merges fragments into one arena-backed graph (`compose`)
//! - normalizes composed nodes into canonical [`ifcgraph_model::Node`]s
//!   (`normalize`) and exposes them through the facade (`accessor`)

pub mod accessor;
pub mod compose;
pub mod document;
pub mod normalize;
pub mod value;

pub use accessor::IfcxAccessor;
pub use compose::{compose, ComposedGraph, CompositionDiagnostics, Fragment, ROOT_NAME};
pub use document::{IfcxDocument, IfcxHeader, RawFragment, VERSION_PATTERN};
pub use normalize::normalize_node;
pub use value::{AttrValue, OrderedMap, PATH_SEPARATOR};
