//! Session configuration.

use ifcgraph_ingest_step::DEFAULT_ROOT_TYPE;
use ifcgraph_model::{Result, DEFAULT_DISPLAY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Entity type whose first instance is the root of a STEP document
    pub root_type: String,
    /// Documents larger than this are rejected before parsing
    pub max_document_bytes: u64,
    /// Joins the parts of a search display name
    pub display_separator: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            max_document_bytes: 512 * 1024 * 1024,
            display_separator: DEFAULT_DISPLAY_SEPARATOR.to_string(),
        }
    }
}

impl SessionConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
