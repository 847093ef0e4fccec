//! Host-level errors

use content_dom::DomError;
use extensions_bridge::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Document(#[from] DomError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid frame: {0}")]
    Frame(String),
}

pub type ContentResult<T> = Result<T, ContentError>;
