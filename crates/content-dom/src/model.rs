//! Core value types shared by the document port

use serde::{Deserialize, Serialize};

/// Opaque handle to a live element inside one document.
///
/// Handles never cross the message boundary; only selectors do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Rendered dimensions (`offsetWidth` / `offsetHeight`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// True when either dimension collapses to zero
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

/// Offset relative to the offset parent (`offsetTop` / `offsetLeft`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// Layout box of an element, relative to its offset parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl LayoutBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            top: self.top,
            left: self.left,
        }
    }
}

/// Scrollable viewport of the document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Subset of `getComputedStyle` the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default = "default_display")]
    pub display: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_display() -> String {
    "block".to_string()
}

fn default_visibility() -> String {
    "visible".to_string()
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: default_display(),
            visibility: default_visibility(),
        }
    }
}

impl ComputedStyle {
    pub fn hidden() -> Self {
        Self {
            visibility: "hidden".to_string(),
            ..Self::default()
        }
    }

    pub fn display_none() -> Self {
        Self {
            display: "none".to_string(),
            ..Self::default()
        }
    }

    pub fn is_display_none(&self) -> bool {
        self.display == "none"
    }

    pub fn is_visibility_hidden(&self) -> bool {
        self.visibility == "hidden"
    }
}
