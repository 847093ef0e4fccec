use action_flow::LoopRequest;
use action_gate::ConditionRequest;
use block_handlers::BlockRequest;
use serde_json::Value;
use soulbrowser_core_types::RequestId;

use crate::errors::BridgeError;

/// Classified inbound command.
#[derive(Clone, Debug)]
pub enum Command {
    Block(BlockRequest),
    ConditionBuilder(ConditionRequest),
    ContentScriptExists,
    GiveMeTheFrameId,
    LoopElements(LoopRequest),
    /// Type tag nobody handles, `None` when the tag is missing
    Unrecognized(Option<String>),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Block(_) => "block",
            Command::ConditionBuilder(_) => "condition-builder",
            Command::ContentScriptExists => "content-script-exists",
            Command::GiveMeTheFrameId => "give-me-the-frame-id",
            Command::LoopElements(_) => "loop-elements",
            Command::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Whether a JSON value counts as set, the way a script condition reads it.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Inbound request with a correlation id.
#[derive(Clone, Debug)]
pub struct Request {
    pub id: RequestId,
    pub command: Command,
}

impl Request {
    /// Classify a raw message.
    ///
    /// Block invocations win over the `type` tag. A known tag with a
    /// payload that does not decode is an error; an unknown tag is not.
    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        if !value.is_object() {
            return Err(BridgeError::InvalidRequest(
                "request envelope: expected an object".into(),
            ));
        }

        let is_block = value.get("isBlock").map_or(false, truthy);
        let command = if is_block {
            Command::Block(serde_json::from_value(value).map_err(invalid("block"))?)
        } else {
            let tag = value.get("type").and_then(Value::as_str).map(str::to_owned);
            match tag.as_deref() {
                Some("condition-builder") => {
                    let data = value.get("data").cloned().unwrap_or(Value::Null);
                    Command::ConditionBuilder(
                        serde_json::from_value(data).map_err(invalid("condition-builder"))?,
                    )
                }
                Some("content-script-exists") => Command::ContentScriptExists,
                Some("give-me-the-frame-id") => Command::GiveMeTheFrameId,
                Some("loop-elements") => Command::LoopElements(
                    serde_json::from_value(value).map_err(invalid("loop-elements"))?,
                ),
                Some(other) => Command::Unrecognized(Some(other.to_string())),
                None => Command::Unrecognized(
                    value.get("type").filter(|tag| !tag.is_null()).map(Value::to_string),
                ),
            }
        };

        Ok(Self {
            id: RequestId::new(),
            command,
        })
    }
}

fn invalid(what: &'static str) -> impl Fn(serde_json::Error) -> BridgeError {
    move |err| BridgeError::InvalidRequest(format!("{what}: {err}"))
}
