//! Error types for locator system

use content_dom::DomError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Selector text could not be evaluated
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Selector mode not accepted by this caller
    #[error("Unsupported selector: {0}")]
    Unsupported(String),

    /// Strategy execution failed
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::StrategyFailed { .. })
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Internal(_) => 3,
            LocatorError::StrategyFailed { .. } => 2,
            LocatorError::InvalidSelector(_) | LocatorError::Unsupported(_) => 1,
        }
    }
}

impl From<DomError> for LocatorError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::InvalidSelector(selector) | DomError::InvalidPath(selector) => {
                LocatorError::InvalidSelector(selector)
            }
            other => LocatorError::Internal(other.to_string()),
        }
    }
}
