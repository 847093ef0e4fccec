//! Scroll primitive - Offset accumulation and viewport centering

use content_dom::{Document, NodeId, Position};
use tracing::debug;

use crate::errors::ActionError;

/// Offset of an element from the document origin.
///
/// Walks the offset-parent chain and sums each hop's offset instead of
/// reading a single bounding rectangle.
pub fn cumulative_offset(document: &dyn Document, node: NodeId) -> Result<Position, ActionError> {
    let mut offset = document.offset_position(node)?;
    let mut current = document.offset_parent(node)?;
    while let Some(parent) = current {
        let hop = document.offset_position(parent)?;
        offset.top += hop.top;
        offset.left += hop.left;
        current = document.offset_parent(parent)?;
    }
    Ok(offset)
}

/// Scroll so the element's top edge sits at the vertical middle of the viewport.
///
/// Returns the requested scroll target.
pub fn center_in_viewport(document: &dyn Document, node: NodeId) -> Result<f64, ActionError> {
    let offset = cumulative_offset(document, node)?;
    let viewport = document.viewport();
    let target = offset.top - viewport.height / 2.0;
    debug!(
        node = node.0,
        offset_top = offset.top,
        target,
        "Centering element in viewport"
    );
    document.scroll_to(0.0, target);
    Ok(target)
}
