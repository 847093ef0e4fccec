//! Error types for condition evaluation

use action_locator::LocatorError;
use action_primitives::ActionError;
use content_dom::DomError;
use thiserror::Error;

/// Condition error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Action segment of an `element#...` type is not a known family
    #[error("Unknown condition action: {0}")]
    UnknownAction(String),

    /// Condition payload is malformed
    #[error("Invalid condition payload: {0}")]
    InvalidSpec(String),

    /// Selector could not be evaluated
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Visibility probe failed
    #[error("Visibility probe failed: {0}")]
    Probe(#[from] ActionError),

    /// Document access failed
    #[error("Document error: {0}")]
    Document(String),
}

impl GateError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Probe(err) if err.is_retryable())
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::Document(_) => 2,
            GateError::Probe(err) => err.severity(),
            GateError::Locator(err) => err.severity(),
            GateError::UnknownAction(_) | GateError::InvalidSpec(_) => 1,
        }
    }
}

impl From<DomError> for GateError {
    fn from(err: DomError) -> Self {
        GateError::Document(err.to_string())
    }
}
