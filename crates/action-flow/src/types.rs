//! Core types for loop tagging

use serde::{Deserialize, Serialize};
use soulbrowser_core_types::RunId;

/// `loop-elements` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRequest {
    pub selector: String,

    /// Bound on tagged elements; zero or negative means unbounded
    #[serde(default)]
    pub max: i64,
}

impl LoopRequest {
    pub fn new(selector: impl Into<String>, max: i64) -> Self {
        Self {
            selector: selector.into(),
            max,
        }
    }
}

/// Markers written by one tagging run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopTags {
    pub run_id: RunId,

    /// One lookup selector per tagged element, in document order
    pub selectors: Vec<String>,
}

impl LoopTags {
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}
