//! Canonical inspection model shared by every IFC backend
//!
//! Both source representations (flat STEP entity tables and composed IFCX
//! fragment graphs) are normalized into the same three shapes:
//!
//! ```text
//!   Node ──┬── attributes: [Attribute] ──► contents: [Content]
//!          │                                   ├─ Value(Scalar)
//!          │                                   └─ Reference(NodeId)
//!          └── references: Attribute   (back-links not exposed elsewhere)
//! ```
//!
//! The [`classify`] function is the single place where a raw backend value
//! becomes [`Content`]; backends describe their values through
//! [`SourceValue`] and never build contents by hand.

pub mod accessor;
pub mod classify;
pub mod error;
pub mod node;
pub mod search;

pub use accessor::Accessor;
pub use classify::{classify, Handle, SourceValue, ValueShape};
pub use error::{GraphError, Result};
pub use node::{Attribute, Content, Node, NodeId, Scalar, REFERENCES_ATTRIBUTE};
pub use search::{display_name, SearchBucket, SearchIndex, SearchItem, DEFAULT_DISPLAY_SEPARATOR};
