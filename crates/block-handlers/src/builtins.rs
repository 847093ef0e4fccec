//! Read-only block handlers shipped with the engine

use action_locator::SelectorDescriptor;
use action_primitives::center_in_viewport;
use async_trait::async_trait;
use content_dom::NodeId;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::BlockError;
use crate::model::{BlockContext, BlockRequest};
use crate::registry::BlockHandler;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributePayload {
    #[serde(flatten)]
    target: SelectorDescriptor,
    attribute_name: String,
}

fn first_or_missing(ctx: &BlockContext, target: &SelectorDescriptor) -> Result<NodeId, BlockError> {
    ctx.resolver
        .resolve_first(target)?
        .ok_or_else(|| BlockError::ElementNotFound(target.selector.clone()))
}

/// `true` when the selector matches at least one element.
pub struct ElementExistsHandler;

#[async_trait]
impl BlockHandler for ElementExistsHandler {
    async fn handle(&self, request: &BlockRequest, ctx: &BlockContext) -> Result<Value, BlockError> {
        let target: SelectorDescriptor = request.payload()?;
        let found = !ctx.resolver.resolve(&target)?.is_empty();
        debug!(selector = %target.selector, found, "elementExists");
        Ok(Value::Bool(found))
    }
}

/// Rendered text of the first match, or of every match when `multiple`.
pub struct GetTextHandler;

#[async_trait]
impl BlockHandler for GetTextHandler {
    async fn handle(&self, request: &BlockRequest, ctx: &BlockContext) -> Result<Value, BlockError> {
        let target: SelectorDescriptor = request.payload()?;
        if target.multiple {
            let texts = ctx
                .resolver
                .resolve(&target)?
                .nodes
                .into_iter()
                .map(|node| ctx.document.inner_text(node))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(json!(texts));
        }
        let node = first_or_missing(ctx, &target)?;
        Ok(Value::String(ctx.document.inner_text(node)?))
    }
}

/// Value of `attributeName` on the first match; `null` when absent.
pub struct AttributeValueHandler;

#[async_trait]
impl BlockHandler for AttributeValueHandler {
    async fn handle(&self, request: &BlockRequest, ctx: &BlockContext) -> Result<Value, BlockError> {
        let payload: AttributePayload = request.payload()?;
        let node = first_or_missing(ctx, &payload.target)?;
        Ok(ctx
            .document
            .get_attribute(node, &payload.attribute_name)?
            .map(Value::String)
            .unwrap_or(Value::Null))
    }
}

/// Center the first match vertically in the viewport.
pub struct ScrollElementHandler;

#[async_trait]
impl BlockHandler for ScrollElementHandler {
    async fn handle(&self, request: &BlockRequest, ctx: &BlockContext) -> Result<Value, BlockError> {
        let target: SelectorDescriptor = request.payload()?;
        let node = first_or_missing(ctx, &target)?;
        center_in_viewport(ctx.document.as_ref(), node)?;
        Ok(Value::Null)
    }
}
