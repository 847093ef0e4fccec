use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Fire-and-forget notifications sent back to the controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    ThisIsTheFrameId { frame_id: String },
}

pub type OutboundBus = broadcast::Sender<OutboundMessage>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_id_wire_shape() {
        let message = OutboundMessage::ThisIsTheFrameId {
            frame_id: "f-1".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "this-is-the-frame-id", "frameId": "f-1"})
        );
    }
}
