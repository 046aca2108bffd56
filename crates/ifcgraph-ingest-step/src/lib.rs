//! IFC STEP ingestion for the inspection graph
//!
//! This crate reads IFC physical files (ISO 10303-21) and exposes them as a
//! flat entity table:
//! - `parser`: STEP syntax -> [`StepEntity`] records
//! - `schema`: built-in IFC attribute layout and inverse declarations
//! - `model`: id/type/GUID/reverse indexes over one file
//! - `normalize`: entity -> canonical [`ifcgraph_model::Node`]
//! - `accessor`: the [`ifcgraph_model::Accessor`] facade for this backend

pub mod accessor;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod schema;

pub use accessor::{StepAccessor, DEFAULT_ROOT_TYPE};
pub use model::{EntityInfo, StepModel};
pub use normalize::{classify_value, normalize_by_id, normalize_entity};
pub use parser::{parse_step, StepEntity, StepFile, StepHeader, StepParseError, StepValue, PREAMBLE};
pub use schema::{EntityDef, InverseDef, Schema};
