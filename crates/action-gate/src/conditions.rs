//! Condition type tags

/// Prefix shared by every element condition type
pub const ELEMENT_CONDITION_PREFIX: &str = "element";

/// Condition family named after the `#` in the type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionAction {
    Text,
    Visible,
    Invisible,
    Attribute,
    /// Anything else, kept verbatim for the error message
    Other(String),
}

impl ConditionAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "text" => ConditionAction::Text,
            "visible" => ConditionAction::Visible,
            "invisible" => ConditionAction::Invisible,
            "attribute" => ConditionAction::Attribute,
            other => ConditionAction::Other(other.to_string()),
        }
    }

    /// Families where a missing element is itself a definite answer
    pub fn absence_is_meaningful(&self) -> bool {
        matches!(self, ConditionAction::Visible | ConditionAction::Invisible)
    }

    pub fn name(&self) -> &str {
        match self {
            ConditionAction::Text => "text",
            ConditionAction::Visible => "visible",
            ConditionAction::Invisible => "invisible",
            ConditionAction::Attribute => "attribute",
            ConditionAction::Other(other) => other,
        }
    }
}

/// Parsed `element#<action>` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionType {
    pub action: ConditionAction,
}

impl ConditionType {
    /// `None` when the tag is not an element condition.
    ///
    /// The action is the second `#`-separated segment; a missing segment
    /// parses as an empty (unknown) action.
    pub fn parse(tag: &str) -> Option<Self> {
        if !tag.starts_with(ELEMENT_CONDITION_PREFIX) {
            return None;
        }
        let action = tag.split('#').nth(1).unwrap_or_default();
        Some(Self {
            action: ConditionAction::parse(action),
        })
    }
}
