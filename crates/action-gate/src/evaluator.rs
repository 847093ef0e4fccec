//! Condition evaluator composing element resolution and visibility probing

use std::sync::Arc;

use action_locator::{ElementResolver, SelectorDescriptor};
use action_primitives::{ExecCtx, VisibilityProber};
use async_trait::async_trait;
use content_dom::{Document, NodeId};
use tracing::{debug, warn};

use crate::{conditions::*, errors::GateError, types::*};

/// Condition evaluator trait
#[async_trait]
pub trait ConditionEvaluator: Send + Sync {
    /// Evaluate one condition request to exactly one outcome
    async fn evaluate(
        &self,
        ctx: &ExecCtx,
        request: &ConditionRequest,
    ) -> Result<ConditionOutcome, GateError>;
}

/// Default condition evaluator over a live document
pub struct DefaultConditionEvaluator {
    document: Arc<dyn Document>,
    resolver: Arc<dyn ElementResolver>,
    prober: VisibilityProber,
}

impl DefaultConditionEvaluator {
    pub fn new(
        document: Arc<dyn Document>,
        resolver: Arc<dyn ElementResolver>,
        prober: VisibilityProber,
    ) -> Self {
        Self {
            document,
            resolver,
            prober,
        }
    }

    /// First match; an unevaluable selector is an error, not a miss.
    fn locate(&self, target: &SelectorDescriptor) -> Result<Option<NodeId>, GateError> {
        self.resolver.resolve_first(target).map_err(|e| {
            warn!(selector = %target.selector, "Condition selector not evaluable: {}", e);
            GateError::from(e)
        })
    }

    async fn visible(&self, ctx: &ExecCtx, node: NodeId) -> Result<bool, GateError> {
        if self.document.offset_size(node)?.is_empty() {
            debug!(node = node.0, "Zero-sized element; skipping probe");
            return Ok(false);
        }
        Ok(self.prober.probe(ctx, node).await?)
    }

    fn invisible(&self, node: NodeId) -> Result<bool, GateError> {
        let style = self.document.computed_style(node)?;
        Ok(style.is_visibility_hidden() || style.is_display_none())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, GateError> {
        if !self.document.has_attribute(node, name)? {
            return Ok(None);
        }
        Ok(self.document.get_attribute(node, name)?)
    }
}

#[async_trait]
impl ConditionEvaluator for DefaultConditionEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecCtx,
        request: &ConditionRequest,
    ) -> Result<ConditionOutcome, GateError> {
        let Some(condition) = ConditionType::parse(&request.condition_type) else {
            debug!(condition_type = %request.condition_type, "Not an element condition");
            return Ok(ConditionOutcome::Null);
        };

        let data: ConditionData = serde_json::from_value(request.data.clone())
            .map_err(|e| GateError::InvalidSpec(e.to_string()))?;

        debug!(
            action = condition.action.name(),
            selector = %data.target.selector,
            "Evaluating element condition"
        );

        let Some(node) = self.locate(&data.target)? else {
            return Ok(if condition.action.absence_is_meaningful() {
                ConditionOutcome::Flag(false)
            } else {
                ConditionOutcome::Null
            });
        };

        let outcome = match &condition.action {
            ConditionAction::Text => ConditionOutcome::Text(self.document.inner_text(node)?),
            ConditionAction::Visible => ConditionOutcome::Flag(self.visible(ctx, node).await?),
            ConditionAction::Invisible => ConditionOutcome::Flag(self.invisible(node)?),
            ConditionAction::Attribute => ConditionOutcome::Attribute(
                self.attribute(node, data.attr_name.as_deref().unwrap_or_default())?,
            ),
            ConditionAction::Other(action) => {
                return Err(GateError::UnknownAction(action.clone()));
            }
        };
        Ok(outcome)
    }
}
