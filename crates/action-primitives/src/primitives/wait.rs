//! Wait primitive - Bounded one-shot intersection sampling

use std::time::Duration;

use content_dom::{Document, NodeId};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{errors::ActionError, types::ExecCtx};

/// Wait for the first intersection report of a node.
///
/// The observation is raced against context cancellation and, when
/// `limit` is set, against a timer.
pub async fn wait_for_intersection(
    document: &dyn Document,
    ctx: &ExecCtx,
    node: NodeId,
    limit: Option<Duration>,
) -> Result<f64, ActionError> {
    if ctx.is_cancelled() {
        return Err(ActionError::Interrupted("Context cancelled".to_string()));
    }

    let observation = async {
        tokio::select! {
            ratio = document.observe_intersection(node) => ratio.map_err(ActionError::from),
            _ = ctx.cancel_token.cancelled() => {
                Err(ActionError::Interrupted("Context cancelled".to_string()))
            }
        }
    };

    let ratio = match limit {
        Some(limit) => match timeout(limit, observation).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    action_id = %ctx.action_id,
                    node = node.0,
                    "Intersection not reported after {}ms",
                    limit.as_millis()
                );
                return Err(ActionError::WaitTimeout(format!(
                    "Intersection not reported after {}ms",
                    limit.as_millis()
                )));
            }
        },
        None => observation.await?,
    };

    debug!(action_id = %ctx.action_id, node = node.0, ratio, "Intersection observed");
    Ok(ratio)
}
