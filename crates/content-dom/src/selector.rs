//! Structural selector parsing and matching for the in-memory document

use crate::errors::DomError;
use crate::memory::Tree;
use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

impl AttrCondition {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        match self {
            AttrCondition::Exists { key } => tree.attr(node, key).is_some(),
            AttrCondition::Eq { key, value } => tree.attr(node, key) == Some(value.as_str()),
            AttrCondition::StartsWith { key, value } => tree
                .attr(node, key)
                .is_some_and(|attr| attr.starts_with(value.as_str())),
            AttrCondition::EndsWith { key, value } => tree
                .attr(node, key)
                .is_some_and(|attr| attr.ends_with(value.as_str())),
            AttrCondition::Contains { key, value } => tree
                .attr(node, key)
                .is_some_and(|attr| attr.contains(value.as_str())),
            AttrCondition::Includes { key, value } => tree
                .attr(node, key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
            AttrCondition::DashMatch { key, value } => tree
                .attr(node, key)
                .is_some_and(|attr| attr == value || attr.starts_with(&format!("{value}-"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(NthChild),
    Not(Box<CompoundSelector>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NthChild {
    Exact(usize),
    Odd,
    Even,
}

impl NthChild {
    fn matches(&self, position: usize) -> bool {
        match self {
            NthChild::Exact(n) => position == *n,
            NthChild::Odd => position % 2 == 1,
            NthChild::Even => position % 2 == 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CompoundSelector {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
    pub(crate) pseudo_classes: Vec<PseudoClass>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
    }

    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(element) = tree.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if tree.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = tree.attr(node, "class").unwrap_or_default();
            if self
                .classes
                .iter()
                .any(|class| !class_attr.split_whitespace().any(|token| token == class))
            {
                return false;
            }
        }

        if !self.attrs.iter().all(|cond| cond.matches(tree, node)) {
            return false;
        }

        self.pseudo_classes.iter().all(|pseudo| match pseudo {
            PseudoClass::FirstChild => tree.element_index(node) == Some(0),
            PseudoClass::LastChild => tree
                .parent(node)
                .map(|parent| tree.children(parent).last() == Some(&node))
                .unwrap_or(true),
            PseudoClass::OnlyChild => tree
                .parent(node)
                .map(|parent| tree.children(parent).len() == 1)
                .unwrap_or(true),
            PseudoClass::NthChild(nth) => tree
                .element_index(node)
                .is_some_and(|index| nth.matches(index + 1)),
            PseudoClass::Not(inner) => !inner.matches(tree, node),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) compound: CompoundSelector,
    // Relation to the part on the left.
    pub(crate) combinator: Option<Combinator>,
}

/// Parsed selector group list (`a, b > c`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList {
    groups: Vec<Vec<SelectorPart>>,
}

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(selector.to_string());
        let groups = split_outside_brackets(selector, ',').ok_or_else(invalid)?;
        let mut parsed = Vec::with_capacity(groups.len());
        for group in groups {
            parsed.push(parse_chain(&group).ok_or_else(invalid)?);
        }
        Ok(Self { groups: parsed })
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|chain| matches_chain(tree, node, chain))
    }
}

fn matches_chain(tree: &Tree, node: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !last.compound.matches(tree, node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match last.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Descendant => {
            let mut current = tree.parent(node);
            while let Some(ancestor) = current {
                if matches_chain(tree, ancestor, rest) {
                    return true;
                }
                current = tree.parent(ancestor);
            }
            false
        }
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|parent| matches_chain(tree, parent, rest)),
        Combinator::AdjacentSibling => tree
            .previous_siblings(node)
            .last()
            .is_some_and(|sibling| matches_chain(tree, *sibling, rest)),
        Combinator::GeneralSibling => tree
            .previous_siblings(node)
            .iter()
            .any(|sibling| matches_chain(tree, *sibling, rest)),
    }
}

fn split_outside_brackets(src: &str, separator: char) -> Option<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in src.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.checked_sub(1)?;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.checked_sub(1)?;
                current.push(ch);
            }
            c if c == separator && bracket_depth == 0 && paren_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return None;
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || paren_depth != 0 || quote.is_some() {
        return None;
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return None;
    }
    groups.push(trimmed.to_string());
    Some(groups)
}

fn tokenize_chain(selector: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.trim().is_empty() {
            tokens.push(current.trim().to_string());
        }
        current.clear();
    };

    for ch in selector.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.checked_sub(1)?;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.checked_sub(1)?;
                current.push(ch);
            }
            '>' | '+' | '~' if bracket_depth == 0 && paren_depth == 0 => {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
            }
            c if c.is_ascii_whitespace() && bracket_depth == 0 && paren_depth == 0 => {
                flush(&mut current, &mut tokens);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut tokens);
    Some(tokens)
}

fn parse_chain(selector: &str) -> Option<Vec<SelectorPart>> {
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize_chain(selector)? {
        let combinator = match token.as_str() {
            ">" => Some(Combinator::Child),
            "+" => Some(Combinator::AdjacentSibling),
            "~" => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending.is_some() || parts.is_empty() {
                return None;
            }
            pending = Some(combinator);
            continue;
        }

        let compound = parse_compound(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart {
            compound,
            combinator,
        });
    }

    if parts.is_empty() || pending.is_some() {
        return None;
    }
    Some(parts)
}

fn parse_compound(src: &str) -> Option<CompoundSelector> {
    let bytes = src.as_bytes();
    let mut i = 0usize;
    let mut compound = CompoundSelector::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if compound.universal || compound.tag.is_some() {
                    return None;
                }
                compound.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(src, i + 1)?;
                if compound.id.replace(id).is_some() {
                    return None;
                }
                i = next;
            }
            b'.' => {
                let (class, next) = parse_ident(src, i + 1)?;
                compound.classes.push(class);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr_condition(src, i)?;
                compound.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (pseudo, next) = parse_pseudo(src, i + 1)?;
                compound.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return None;
                }
                let (tag, next) = parse_ident(src, i)?;
                compound.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    (!compound.is_empty()).then_some(compound)
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_ident_char(bytes[end]) {
        end += 1;
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

fn parse_pseudo(src: &str, start: usize) -> Option<(PseudoClass, usize)> {
    let (name, mut next) = parse_ident(src, start)?;
    let argument = if src.as_bytes().get(next) == Some(&b'(') {
        let close = find_closing_paren(src, next)?;
        let arg = src[next + 1..close].trim().to_string();
        next = close + 1;
        Some(arg)
    } else {
        None
    };

    let pseudo = match (name.to_ascii_lowercase().as_str(), argument) {
        ("first-child", None) => PseudoClass::FirstChild,
        ("last-child", None) => PseudoClass::LastChild,
        ("only-child", None) => PseudoClass::OnlyChild,
        ("nth-child", Some(arg)) => PseudoClass::NthChild(match arg.as_str() {
            "odd" => NthChild::Odd,
            "even" => NthChild::Even,
            n => NthChild::Exact(n.parse().ok().filter(|n: &usize| *n > 0)?),
        }),
        ("not", Some(arg)) => PseudoClass::Not(Box::new(parse_compound(&arg)?)),
        _ => return None,
    };
    Some((pseudo, next))
}

fn find_closing_paren(src: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, b) in src.as_bytes()[open..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_attr_condition(src: &str, open: usize) -> Option<(AttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open + 1;
    let skip_ws = |i: &mut usize| {
        while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
            *i += 1;
        }
    };

    skip_ws(&mut i);
    let key_start = i;
    while i < bytes.len() && (is_ident_char(bytes[i]) || bytes[i] == b':') {
        i += 1;
    }
    if key_start == i {
        return None;
    }
    let key = src[key_start..i].to_ascii_lowercase();
    skip_ws(&mut i);

    if *bytes.get(i)? == b']' {
        return Some((AttrCondition::Exists { key }, i + 1));
    }

    let (op, after_op) = match (bytes.get(i)?, bytes.get(i + 1)) {
        (b'=', _) => (b'=', i + 1),
        (op @ (b'^' | b'$' | b'*' | b'~' | b'|'), Some(b'=')) => (*op, i + 2),
        _ => return None,
    };
    i = after_op;
    skip_ws(&mut i);

    let (value, after_value) = parse_attr_value(src, i)?;
    i = after_value;
    skip_ws(&mut i);
    if *bytes.get(i)? != b']' {
        return None;
    }

    let cond = match op {
        b'=' => AttrCondition::Eq { key, value },
        b'^' => AttrCondition::StartsWith { key, value },
        b'$' => AttrCondition::EndsWith { key, value },
        b'*' => AttrCondition::Contains { key, value },
        b'~' => AttrCondition::Includes { key, value },
        _ => AttrCondition::DashMatch { key, value },
    };
    Some((cond, i + 1))
}

fn parse_attr_value(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let first = *bytes.get(start)?;
    if first == b'"' || first == b'\'' {
        let close = src[start + 1..].find(first as char)? + start + 1;
        return Some((src[start + 1..close].to_string(), close + 1));
    }

    let mut end = start;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b']' {
        end += 1;
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_with_attributes() {
        let list = SelectorList::parse(r#"div.item[data-role="row"]:nth-child(2)"#).unwrap();
        let part = &list.groups[0][0];
        assert_eq!(part.compound.tag.as_deref(), Some("div"));
        assert_eq!(part.compound.classes, vec!["item".to_string()]);
        assert_eq!(
            part.compound.attrs,
            vec![AttrCondition::Eq {
                key: "data-role".into(),
                value: "row".into()
            }]
        );
        assert_eq!(
            part.compound.pseudo_classes,
            vec![PseudoClass::NthChild(NthChild::Exact(2))]
        );
    }

    #[test]
    fn parses_loop_marker_lookup() {
        let list = SelectorList::parse(r#"[soul-loop="aB3_x--2"]"#).unwrap();
        assert_eq!(
            list.groups[0][0].compound.attrs,
            vec![AttrCondition::Eq {
                key: "soul-loop".into(),
                value: "aB3_x--2".into()
            }]
        );
    }

    #[test]
    fn parses_combinators_and_groups() {
        let list = SelectorList::parse("ul > li + li, main p").unwrap();
        assert_eq!(list.groups.len(), 2);
        let combinators: Vec<_> = list.groups[0].iter().map(|p| p.combinator).collect();
        assert_eq!(
            combinators,
            vec![
                None,
                Some(Combinator::Child),
                Some(Combinator::AdjacentSibling)
            ]
        );
        assert_eq!(list.groups[1][1].combinator, Some(Combinator::Descendant));
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "div[", "> a", "a >", "a,,b", ":hover", "div:nth-child(0)"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(DomError::InvalidSelector(_))),
                "{bad} should be rejected"
            );
        }
    }
}
