use std::fmt;

/// Camel-case a block name the way the controller spells handler keys.
///
/// Whitespace and `-` are dropped and the following letter is upper-cased;
/// the first letter is lower-cased. `event-click` becomes `eventClick`.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut boundary = false;
    for ch in name.chars() {
        if ch.is_whitespace() || ch == '-' {
            boundary = true;
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if boundary {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        boundary = !(ch.is_alphanumeric() || ch == '_');
    }
    out
}

/// Block kinds this engine knows how to run.
///
/// `Unknown` keeps any other normalized name so externally registered
/// handlers can still be found.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlockKind {
    ElementExists,
    GetText,
    AttributeValue,
    ScrollElement,
    Unknown(String),
}

impl BlockKind {
    /// Every known kind; each has a built-in handler.
    pub const KNOWN: [BlockKind; 4] = [
        BlockKind::ElementExists,
        BlockKind::GetText,
        BlockKind::AttributeValue,
        BlockKind::ScrollElement,
    ];

    pub fn parse(name: &str) -> Self {
        let normalized = to_camel_case(name);
        match normalized.as_str() {
            "elementExists" => BlockKind::ElementExists,
            "getText" => BlockKind::GetText,
            "attributeValue" => BlockKind::AttributeValue,
            "scrollElement" => BlockKind::ScrollElement,
            _ => BlockKind::Unknown(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::ElementExists => "elementExists",
            BlockKind::GetText => "getText",
            BlockKind::AttributeValue => "attributeValue",
            BlockKind::ScrollElement => "scrollElement",
            BlockKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
