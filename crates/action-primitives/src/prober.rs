//! "Center then sample" visibility prober

use std::sync::Arc;

use content_dom::{Document, NodeId};
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    primitives::{center_in_viewport, wait_for_intersection},
    types::{ExecCtx, ProbeConfig},
};

/// Decides whether an element is fully inside the viewport once centered.
///
/// Observations are relative to the current scroll state, so the element is
/// first brought to a deterministic position. Each call owns its own
/// observation; concurrent probes do not share state.
#[derive(Clone)]
pub struct VisibilityProber {
    document: Arc<dyn Document>,
    config: ProbeConfig,
}

impl VisibilityProber {
    pub fn new(document: Arc<dyn Document>, config: ProbeConfig) -> Self {
        Self { document, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// `true` iff the reported intersection ratio is exactly 1.
    pub async fn probe(&self, ctx: &ExecCtx, node: NodeId) -> Result<bool, ActionError> {
        center_in_viewport(self.document.as_ref(), node)?;
        let ratio =
            wait_for_intersection(self.document.as_ref(), ctx, node, self.config.probe_timeout)
                .await?;
        let visible = ratio == 1.0;
        if visible {
            debug!(action_id = %ctx.action_id, node = node.0, "Element fully in view");
        } else {
            info!(
                action_id = %ctx.action_id,
                node = node.0,
                ratio,
                "Element not fully in view after centering"
            );
        }
        Ok(visible)
    }
}
