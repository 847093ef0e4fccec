//! Error types for document access

use thiserror::Error;

/// Document error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Structural selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Path expression could not be parsed
    #[error("Invalid path expression: {0}")]
    InvalidPath(String),

    /// Node handle does not belong to this document
    #[error("Unknown node: {0}")]
    UnknownNode(usize),

    /// Observation channel closed before reporting
    #[error("Observation aborted: {0}")]
    ObservationAborted(String),

    /// Fixture could not be loaded
    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl DomError {
    /// Check whether the error comes from the caller's query text
    pub fn is_query_error(&self) -> bool {
        matches!(self, DomError::InvalidSelector(_) | DomError::InvalidPath(_))
    }
}
