use action_locator::LocatorError;
use action_primitives::ActionError;
use content_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("invalid block payload: {0}")]
    InvalidPayload(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("document error: {0}")]
    Document(String),
    #[error("{0}")]
    Failed(String),
}

impl From<DomError> for BlockError {
    fn from(err: DomError) -> Self {
        BlockError::Document(err.to_string())
    }
}
