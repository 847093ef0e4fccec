//! Error types for page primitives

use content_dom::DomError;
use thiserror::Error;

/// Error types for page primitive operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Wait operation timed out
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Operation was cancelled or interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Scroll target is invalid or unreachable
    #[error("Scroll target invalid: {0}")]
    ScrollTargetInvalid(String),

    /// Document access failed
    #[error("Document error: {0}")]
    Document(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::WaitTimeout(_))
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::Document(_) => 2,
            ActionError::WaitTimeout(_) | ActionError::ScrollTargetInvalid(_) => 1,
            ActionError::Interrupted(_) => 0,
        }
    }
}

impl From<DomError> for ActionError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::UnknownNode(id) => {
                ActionError::ScrollTargetInvalid(format!("node {id} is not in the document"))
            }
            other => ActionError::Document(other.to_string()),
        }
    }
}
