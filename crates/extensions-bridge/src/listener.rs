use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatcher::CommandDispatcher;
use crate::errors::BridgeError;

/// Reply delivered for one request.
pub type Reply = Result<Value, String>;
pub type Responder = oneshot::Sender<Reply>;
/// One inbound message with its reply slot.
pub type Envelope = (Value, Responder);

/// Serves a message channel, one spawned task per request.
///
/// Responders of unhandled requests are parked instead of dropped so the
/// caller keeps waiting, as it would on a listener that never answers. A
/// parked responder is released once its caller stops waiting.
pub struct ChannelListener {
    dispatcher: Arc<dyn CommandDispatcher>,
    parked: AtomicUsize,
}

impl ChannelListener {
    pub fn new(dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        Self {
            dispatcher,
            parked: AtomicUsize::new(0),
        }
    }

    /// Unanswered requests whose callers are still waiting.
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    /// Run until every sender is dropped.
    pub fn spawn(self: Arc<Self>, mut inbound: mpsc::Receiver<Envelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some((message, mut responder)) = inbound.recv().await {
                let listener = Arc::clone(&self);
                tokio::spawn(async move {
                    let outcome = listener.dispatcher.dispatch(message).await;
                    match outcome.into_reply() {
                        Some(reply) => {
                            if responder.send(reply).is_err() {
                                debug!("Requester went away before the reply");
                            }
                        }
                        None => {
                            listener.parked.fetch_add(1, Ordering::SeqCst);
                            responder.closed().await;
                            listener.parked.fetch_sub(1, Ordering::SeqCst);
                            debug!("Caller of an unanswered request stopped waiting");
                        }
                    }
                });
            }
            debug!("Inbound channel closed; listener stopping");
        })
    }
}

/// Sending side of the message channel.
#[derive(Clone)]
pub struct ContentClient {
    outbound: mpsc::Sender<Envelope>,
}

impl ContentClient {
    pub fn new(outbound: mpsc::Sender<Envelope>) -> Self {
        Self { outbound }
    }

    /// Create a bounded channel pair.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Send a message and wait for its reply.
    pub async fn send(&self, message: Value) -> Result<Reply, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.outbound
            .send((message, tx))
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        rx.await.map_err(|_| BridgeError::ChannelClosed)
    }

    /// Like [`send`](Self::send) but gives up after `limit`.
    pub async fn send_with_timeout(
        &self,
        message: Value,
        limit: Duration,
    ) -> Result<Reply, BridgeError> {
        tokio::time::timeout(limit, self.send(message))
            .await
            .map_err(|_| BridgeError::Timeout)?
    }
}
