//! IFCX documents as loaded from disk.

use ifcgraph_model::{GraphError, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Accepted values of the header version field.
pub const VERSION_PATTERN: &str = r"^ifcx[-_]alpha$";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("valid version pattern"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IfcxHeader {
    #[serde(default, alias = "ifcxVersion")]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One fragment as written in a document. The same identifier may appear in
/// many fragments; they are merged by the composer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFragment {
    #[serde(alias = "path")]
    pub identifier: String,
    /// edge name -> target identifier; `null` removes an edge set earlier
    #[serde(default)]
    pub children: Map<String, Value>,
    #[serde(default)]
    pub inherits: Map<String, Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IfcxDocument {
    #[serde(skip)]
    pub source_name: String,
    #[serde(default)]
    pub header: IfcxHeader,
    #[serde(default)]
    pub data: Vec<RawFragment>,
}

impl IfcxDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path.display().to_string(), &text)
    }

    /// Parse and version-check a document.
    pub fn parse(source_name: impl Into<String>, text: &str) -> Result<Self> {
        let source_name = source_name.into();
        let mut document: IfcxDocument = serde_json::from_str(text)?;
        document.source_name = source_name;
        document.check_version()?;
        debug!(
            source = %document.source_name,
            fragments = document.data.len(),
            "loaded IFCX document"
        );
        Ok(document)
    }

    pub fn check_version(&self) -> Result<()> {
        match self.header.version.as_deref() {
            Some(v) if version_regex().is_match(v) => Ok(()),
            Some(v) => Err(GraphError::invalid_format(
                &self.source_name,
                format!("unsupported IFCX version {v:?}"),
            )),
            None => Err(GraphError::invalid_format(
                &self.source_name,
                "missing header version",
            )),
        }
    }
}
