//! Newline-delimited JSON transport
//!
//! Each inbound line is a frame `{"id": <any>, "message": {...}}`. Answered
//! requests produce `{"id", "ok": true, "data"}` or `{"id", "ok": false,
//! "error"}`; unrecognized request types produce no line at all. Outbound
//! notifications are written as `{"notification": {...}}`.

use std::sync::Arc;

use extensions_bridge::{CommandDispatcher, OutboundMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::{ContentError, ContentResult};

#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(default)]
    id: Value,
    message: Value,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OutboundFrame {
    Reply {
        id: Value,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Notification {
        notification: OutboundMessage,
    },
}

impl OutboundFrame {
    fn from_reply(id: Value, reply: Result<Value, String>) -> Self {
        match reply {
            Ok(data) => Self::Reply {
                id,
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self::Reply {
                id,
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Counters reported when the input stream ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub received: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub malformed: usize,
}

/// Serve frames from `reader` until end of input, writing replies to `writer`.
///
/// Requests run concurrently; replies are written in completion order.
pub async fn serve_lines<R, W>(
    dispatcher: Arc<dyn CommandDispatcher>,
    notifications: broadcast::Receiver<OutboundMessage>,
    reader: R,
    writer: W,
) -> ContentResult<ServeStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (frames, frame_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_frames(writer, frame_rx));

    let mut stats = ServeStats::default();
    let mut in_flight: JoinSet<bool> = JoinSet::new();
    let mut notifications = Some(notifications);
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                stats.received += 1;
                let frame = match serde_json::from_str::<InboundFrame>(&line) {
                    Ok(frame) => frame,
                    Err(err) => {
                        let err = ContentError::Frame(err.to_string());
                        warn!("Dropping malformed frame: {}", err);
                        stats.malformed += 1;
                        let _ = frames.send(OutboundFrame::from_reply(Value::Null, Err(err.to_string())));
                        continue;
                    }
                };
                let dispatcher = dispatcher.clone();
                let frames = frames.clone();
                in_flight.spawn(async move {
                    match dispatcher.dispatch(frame.message).await.into_reply() {
                        Some(reply) => {
                            let _ = frames.send(OutboundFrame::from_reply(frame.id, reply));
                            true
                        }
                        None => {
                            debug!(id = %frame.id, "Request left unanswered");
                            false
                        }
                    }
                });
            }
            notification = next_notification(&mut notifications) => {
                if let Some(notification) = notification {
                    let _ = frames.send(OutboundFrame::Notification { notification });
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok(true) => stats.answered += 1,
            Ok(false) => stats.unanswered += 1,
            Err(err) => warn!("Request task failed: {}", err),
        }
    }

    if let Some(rx) = notifications.as_mut() {
        while let Ok(notification) = rx.try_recv() {
            let _ = frames.send(OutboundFrame::Notification { notification });
        }
    }

    drop(frames);
    writer_task
        .await
        .map_err(|err| ContentError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))??;

    debug!(?stats, "Input stream ended");
    Ok(stats)
}

/// Next notification; pends forever once the bus is gone.
async fn next_notification(
    rx: &mut Option<broadcast::Receiver<OutboundMessage>>,
) -> Option<OutboundMessage> {
    let Some(receiver) = rx.as_mut() else {
        return std::future::pending().await;
    };
    match receiver.recv().await {
        Ok(message) => Some(message),
        Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "Notification subscriber lagged");
            None
        }
        Err(RecvError::Closed) => {
            *rx = None;
            None
        }
    }
}

async fn write_frames<W>(
    mut writer: W,
    mut frames: mpsc::UnboundedReceiver<OutboundFrame>,
) -> ContentResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        let mut line = serde_json::to_vec(&frame)
            .map_err(|err| ContentError::Frame(format!("Failed to encode reply: {err}")))?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}
