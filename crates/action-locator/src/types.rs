//! Core types for locator system

use content_dom::NodeId;
use serde::{Deserialize, Serialize};

/// Selector mode, decided purely by the selector's prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorKind {
    /// Hierarchical path expression (`/html/body`, `(//li)[2]`)
    Path,

    /// Structural/attribute selector (`ul > li.item`)
    Structural,
}

impl SelectorKind {
    /// Classify a selector string.
    pub fn classify(selector: &str) -> Self {
        if selector.starts_with('/') || selector.starts_with("(/") {
            SelectorKind::Path
        } else {
            SelectorKind::Structural
        }
    }

    /// Get kind name as string
    pub fn name(&self) -> &'static str {
        match self {
            SelectorKind::Path => "path",
            SelectorKind::Structural => "structural",
        }
    }
}

/// Selector plus lookup flags, as carried in request payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorDescriptor {
    pub selector: String,

    /// Caller wants every match rather than the first
    #[serde(default)]
    pub multiple: bool,
}

impl SelectorDescriptor {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            multiple: false,
        }
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn kind(&self) -> SelectorKind {
        SelectorKind::classify(&self.selector)
    }
}

/// Live elements matched by one descriptor, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSet {
    pub kind: SelectorKind,
    pub nodes: Vec<NodeId>,
}

impl ResolvedSet {
    pub fn new(kind: SelectorKind, nodes: Vec<NodeId>) -> Self {
        Self { kind, nodes }
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
