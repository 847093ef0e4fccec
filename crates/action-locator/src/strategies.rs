//! Element resolution strategies
//!
//! One strategy per selector mode:
//! 1. Path - location path evaluation
//! 2. Structural - selector list matching

use std::sync::Arc;

use content_dom::{Document, NodeId};
use tracing::debug;

use crate::{errors::LocatorError, types::SelectorKind};

/// Strategy trait for element resolution
pub trait Strategy: Send + Sync {
    /// All matches for the selector, in document order
    fn resolve(&self, selector: &str) -> Result<Vec<NodeId>, LocatorError>;

    /// Get the selector mode this strategy serves
    fn kind(&self) -> SelectorKind;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Path-query resolution strategy
pub struct PathStrategy {
    document: Arc<dyn Document>,
}

impl PathStrategy {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self { document }
    }
}

impl Strategy for PathStrategy {
    fn resolve(&self, selector: &str) -> Result<Vec<NodeId>, LocatorError> {
        debug!("Evaluating path query: {}", selector);
        Ok(self.document.evaluate_path(selector)?)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::Path
    }
}

/// Structural-query resolution strategy
pub struct StructuralStrategy {
    document: Arc<dyn Document>,
}

impl StructuralStrategy {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self { document }
    }
}

impl Strategy for StructuralStrategy {
    fn resolve(&self, selector: &str) -> Result<Vec<NodeId>, LocatorError> {
        debug!("Evaluating structural query: {}", selector);
        Ok(self.document.query_selector_all(selector)?)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::Structural
    }
}
