use std::sync::Arc;

use action_flow::LoopTagger;
use action_gate::{ConditionEvaluator, DefaultConditionEvaluator};
use action_primitives::{ExecCtx, ProbeConfig};
use async_trait::async_trait;
use block_handlers::{BlockContext, BlockRequest, HandlerRegistry};
use content_dom::Document;
use serde_json::{json, Value};
use soulbrowser_core_types::FrameId;
use soulbrowser_state_center::InProgressMarks;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::events::{OutboundBus, OutboundMessage};
use crate::guard::InjectionGuard;
use crate::request::{Command, Request};

/// Result of handling one request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Resolved(Value),
    Rejected(String),
    /// Never answered; the caller's future stays pending
    Unhandled,
}

impl Outcome {
    /// Reply to send back, `None` for unhandled requests.
    pub fn into_reply(self) -> Option<Result<Value, String>> {
        match self {
            Outcome::Resolved(value) => Some(Ok(value)),
            Outcome::Rejected(reason) => Some(Err(reason)),
            Outcome::Unhandled => None,
        }
    }
}

#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, message: Value) -> Outcome;
}

/// Routes classified commands to the engine components.
pub struct Dispatcher {
    evaluator: Arc<dyn ConditionEvaluator>,
    tagger: LoopTagger,
    registry: Arc<HandlerRegistry>,
    marks: Arc<InProgressMarks>,
    blocks: BlockContext,
    outbound: OutboundBus,
    frame_id: FrameId,
    show_executed_block: bool,
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Install the dispatcher for one document context.
    ///
    /// Fails with [`BridgeError::AlreadyInjected`] when the guard was
    /// already claimed.
    pub fn install(
        guard: &InjectionGuard,
        document: Arc<dyn Document>,
        registry: Arc<HandlerRegistry>,
        config: &BridgeConfig,
        outbound: OutboundBus,
    ) -> Result<Arc<Self>, BridgeError> {
        guard.claim()?;

        let blocks = BlockContext::new(
            document.clone(),
            ProbeConfig::from_millis(config.probe_timeout_ms),
        );
        let evaluator = DefaultConditionEvaluator::new(
            document.clone(),
            blocks.resolver.clone(),
            blocks.prober.clone(),
        );
        let tagger = LoopTagger::new(document.clone(), blocks.resolver.clone());
        let marks = Arc::new(InProgressMarks::with_document(
            soulbrowser_state_center::DEFAULT_HISTORY,
            document,
        ));
        let frame_id = config
            .frame_id
            .clone()
            .map(FrameId)
            .unwrap_or_default();

        debug!(frame_id = %frame_id.0, handlers = registry.len(), "Dispatcher installed");
        Ok(Arc::new(Self {
            evaluator: Arc::new(evaluator),
            tagger,
            registry,
            marks,
            blocks,
            outbound,
            frame_id,
            show_executed_block: config.show_executed_block,
            shutdown: CancellationToken::new(),
        }))
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    pub fn marks(&self) -> &Arc<InProgressMarks> {
        &self.marks
    }

    /// Abort pending visibility probes.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn exec_ctx(&self) -> ExecCtx {
        ExecCtx::new(self.shutdown.child_token())
    }

    /// Handle one classified request.
    pub async fn handle(&self, request: Request) -> Outcome {
        let span = info_span!(
            "content_request",
            request_id = %request.id,
            command = request.command.name()
        );
        self.route(request.command).instrument(span).await
    }

    async fn route(&self, command: Command) -> Outcome {
        match command {
            Command::Block(block) => self.run_block(block).await,
            Command::ConditionBuilder(condition) => {
                match self.evaluator.evaluate(&self.exec_ctx(), &condition).await {
                    Ok(outcome) => Outcome::Resolved(outcome.to_value()),
                    Err(err) => Outcome::Rejected(err.to_string()),
                }
            }
            Command::ContentScriptExists => Outcome::Resolved(Value::Bool(true)),
            Command::GiveMeTheFrameId => {
                let message = OutboundMessage::ThisIsTheFrameId {
                    frame_id: self.frame_id.0.clone(),
                };
                if self.outbound.send(message).is_err() {
                    debug!("No outbound subscribers for frame id notification");
                }
                Outcome::Resolved(Value::Null)
            }
            Command::LoopElements(request) => match self.tagger.tag(&request) {
                Ok(tags) => Outcome::Resolved(json!(tags.selectors)),
                Err(err) => Outcome::Rejected(err.to_string()),
            },
            Command::Unrecognized(tag) => {
                warn!(tag = tag.as_deref().unwrap_or("<none>"), "Unrecognized request type left unanswered");
                Outcome::Unhandled
            }
        }
    }

    async fn run_block(&self, block: BlockRequest) -> Outcome {
        let kind = block.kind();
        let show_on_page = self.show_executed_block && block.executed_block_on_web;
        // Released on every exit path, including cancellation of this future.
        let _mark = self
            .marks
            .acquire(block.block_id(), kind.to_string(), show_on_page);

        let Some(handler) = self.registry.get(&kind) else {
            error!("\"{}\" doesn't have a handler", block.name);
            return Outcome::Resolved(Value::String(String::new()));
        };

        let ctx = self.blocks.clone().with_exec(self.exec_ctx());
        match handler.handle(&block, &ctx).await {
            Ok(value) => Outcome::Resolved(value),
            Err(err) => {
                warn!(block = %kind, "Block handler failed: {}", err);
                Outcome::Rejected(err.to_string())
            }
        }
    }
}

#[async_trait]
impl CommandDispatcher for Dispatcher {
    async fn dispatch(&self, message: Value) -> Outcome {
        match Request::from_value(message) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!("Rejecting request: {}", err);
                Outcome::Rejected(err.to_string())
            }
        }
    }
}
