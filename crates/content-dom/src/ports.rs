use async_trait::async_trait;

use crate::errors::DomError;
use crate::model::{ComputedStyle, NodeId, Position, Size, Viewport};

/// Host document APIs consumed by the in-page engine.
///
/// Every call reads or writes the live document directly; the engine relies
/// on the host's single-threaded cooperative model instead of locking.
#[async_trait]
pub trait Document: Send + Sync {
    /// All elements matching a structural selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError>;

    /// All elements matching a path expression, in document order.
    fn evaluate_path(&self, expression: &str) -> Result<Vec<NodeId>, DomError>;

    fn document_element(&self) -> Option<NodeId>;

    fn inner_text(&self, node: NodeId) -> Result<String, DomError>;

    fn offset_size(&self, node: NodeId) -> Result<Size, DomError>;

    fn offset_position(&self, node: NodeId) -> Result<Position, DomError>;

    fn offset_parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError>;

    fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool, DomError>;

    fn get_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError>;

    fn viewport(&self) -> Viewport;

    fn scroll_to(&self, x: f64, y: f64);

    /// One-shot intersection observation.
    ///
    /// Resolves with the intersection ratio the first time layout reports it
    /// and stops observing afterwards. A node that never lays out keeps the
    /// future pending forever; callers bound the wait themselves.
    async fn observe_intersection(&self, node: NodeId) -> Result<f64, DomError>;
}
