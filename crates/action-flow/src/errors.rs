//! Loop tagging error types

use action_locator::LocatorError;
use content_dom::DomError;
use thiserror::Error;

/// Loop tagging errors
#[derive(Debug, Error)]
pub enum FlowError {
    /// Loop request payload is malformed
    #[error("Invalid loop request: {0}")]
    InvalidRequest(String),

    /// Selector could not be resolved
    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),

    /// Marker write failed
    #[error("Document error: {0}")]
    Document(String),
}

impl From<DomError> for FlowError {
    fn from(err: DomError) -> Self {
        FlowError::Document(err.to_string())
    }
}
