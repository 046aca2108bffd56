//! Error taxonomy shared by the backends and the facade.

use thiserror::Error;

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GraphError {
    /// The document is not of the expected kind or declares an unsupported
    /// version. Fatal for the whole load/compose call.
    #[error("invalid format in {source_name}: {message}")]
    InvalidFormat { source_name: String, message: String },

    /// An id, type, GUID, or root lookup had no match.
    #[error("not found: {0}")]
    NotFound(String),

    /// The flat-table source could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GraphError {
    pub fn invalid_format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        GraphError::InvalidFormat {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        GraphError::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}
