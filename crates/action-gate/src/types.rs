//! Core types for condition evaluation

use action_locator::SelectorDescriptor;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Condition request as it arrives from the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionRequest {
    #[serde(rename = "type", default)]
    pub condition_type: String,

    /// Parsed lazily: non-element types never read it
    #[serde(default)]
    pub data: Value,
}

impl ConditionRequest {
    pub fn new(condition_type: impl Into<String>, data: Value) -> Self {
        Self {
            condition_type: condition_type.into(),
            data,
        }
    }
}

/// Payload of an element condition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionData {
    #[serde(flatten)]
    pub target: SelectorDescriptor,

    /// Attribute to read for the `attribute` family
    #[serde(default)]
    pub attr_name: Option<String>,
}

/// Result of one condition evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// Rendered text
    Text(String),

    /// Visible / invisible answer
    Flag(bool),

    /// Attribute value, `None` when absent
    Attribute(Option<String>),

    /// Not an element condition, or element missing where absence means nothing
    Null,
}

impl ConditionOutcome {
    pub fn to_value(&self) -> Value {
        match self {
            ConditionOutcome::Text(text) => Value::String(text.clone()),
            ConditionOutcome::Flag(flag) => Value::Bool(*flag),
            ConditionOutcome::Attribute(Some(value)) => Value::String(value.clone()),
            ConditionOutcome::Attribute(None) | ConditionOutcome::Null => Value::Null,
        }
    }
}

impl Serialize for ConditionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_json_shapes() {
        assert_eq!(ConditionOutcome::Text("hi".into()).to_value(), json!("hi"));
        assert_eq!(ConditionOutcome::Flag(false).to_value(), json!(false));
        assert_eq!(ConditionOutcome::Attribute(Some(String::new())).to_value(), json!(""));
        assert_eq!(ConditionOutcome::Attribute(None).to_value(), Value::Null);
        assert_eq!(
            serde_json::to_string(&ConditionOutcome::Null).unwrap(),
            "null"
        );
    }

    #[test]
    fn test_condition_data_camel_case() {
        let data: ConditionData = serde_json::from_value(json!({
            "selector": "#a",
            "multiple": false,
            "attrName": "data-x"
        }))
        .unwrap();
        assert_eq!(data.target.selector, "#a");
        assert_eq!(data.attr_name.as_deref(), Some("data-x"));
    }
}
