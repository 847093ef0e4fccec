//! Path-query evaluation for the in-memory document
//!
//! Supports the location-path subset automation selectors use in practice:
//! absolute `/` and descendant `//` steps, `*`, `.`/`..`, positional and
//! attribute/text predicates, and a parenthesised group with trailing
//! predicates (`(//li)[2]`).

use std::collections::HashSet;

use crate::errors::DomError;
use crate::memory::Tree;
use crate::model::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepKind {
    Name(String),
    Any,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Attr(String),
    Text,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    Exists(Operand),
    Equals(Operand, String),
    Contains(Operand, String),
    StartsWith(Operand, String),
    And(Vec<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    kind: StepKind,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathExpr {
    steps: Vec<Step>,
    // Predicates applied to the whole node-set of a parenthesised group.
    group_predicates: Vec<Predicate>,
}

impl PathExpr {
    pub(crate) fn parse(expression: &str) -> Result<Self, DomError> {
        let mut parser = Parser::new(expression);
        let expr = parser
            .parse_expr()
            .ok_or_else(|| DomError::InvalidPath(expression.to_string()))?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(DomError::InvalidPath(expression.to_string()));
        }
        Ok(expr)
    }

    pub(crate) fn evaluate(&self, tree: &Tree) -> Vec<NodeId> {
        // `None` stands for the document node above the root element.
        let mut context: Vec<Option<NodeId>> = vec![None];

        for step in &self.steps {
            let mut next = Vec::new();
            for origin in &context {
                next.extend(evaluate_step(tree, *origin, step));
            }
            context = dedupe_in_document_order(tree, next);
        }

        let nodes: Vec<NodeId> = context.into_iter().flatten().collect();
        if self.group_predicates.is_empty() {
            return nodes;
        }
        apply_predicates(tree, nodes, &self.group_predicates)
    }
}

fn evaluate_step(tree: &Tree, origin: Option<NodeId>, step: &Step) -> Vec<Option<NodeId>> {
    match step.kind {
        StepKind::SelfNode => return vec![origin],
        StepKind::Parent => {
            return origin.map(|node| tree.parent(node)).into_iter().collect();
        }
        _ => {}
    }

    let mut origins = vec![origin];
    if step.axis == Axis::Descendant {
        origins.extend(tree.descendants_of(origin).into_iter().map(Some));
    }

    let mut matched = Vec::new();
    for parent in origins {
        let candidates: Vec<NodeId> = tree
            .children_of(parent)
            .into_iter()
            .filter(|child| match &step.kind {
                StepKind::Name(name) => tree
                    .element(*child)
                    .is_some_and(|el| el.tag.eq_ignore_ascii_case(name)),
                _ => true,
            })
            .collect();
        matched.extend(
            apply_predicates(tree, candidates, &step.predicates)
                .into_iter()
                .map(Some),
        );
    }
    matched
}

fn apply_predicates(tree: &Tree, mut nodes: Vec<NodeId>, predicates: &[Predicate]) -> Vec<NodeId> {
    for predicate in predicates {
        let size = nodes.len();
        nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|(index, node)| predicate_holds(tree, *node, index + 1, size, predicate))
            .map(|(_, node)| node)
            .collect();
    }
    nodes
}

fn predicate_holds(
    tree: &Tree,
    node: NodeId,
    position: usize,
    size: usize,
    predicate: &Predicate,
) -> bool {
    match predicate {
        Predicate::Position(n) => position == *n,
        Predicate::Last => position == size,
        Predicate::Exists(operand) => operand_value(tree, node, operand).is_some(),
        Predicate::Equals(operand, literal) => {
            operand_value(tree, node, operand).is_some_and(|value| value == *literal)
        }
        Predicate::Contains(operand, literal) => operand_value(tree, node, operand)
            .is_some_and(|value| value.contains(literal.as_str())),
        Predicate::StartsWith(operand, literal) => operand_value(tree, node, operand)
            .is_some_and(|value| value.starts_with(literal.as_str())),
        Predicate::And(parts) => parts
            .iter()
            .all(|part| predicate_holds(tree, node, position, size, part)),
    }
}

fn operand_value(tree: &Tree, node: NodeId, operand: &Operand) -> Option<String> {
    match operand {
        Operand::Attr(name) => tree.attr(node, name).map(str::to_string),
        Operand::Text => tree
            .element(node)
            .map(|el| el.text.clone())
            .filter(|text| !text.is_empty()),
        Operand::Context => Some(tree.text_content(node)),
    }
}

fn dedupe_in_document_order(tree: &Tree, nodes: Vec<Option<NodeId>>) -> Vec<Option<NodeId>> {
    let has_document = nodes.iter().any(Option::is_none);
    let members: HashSet<NodeId> = nodes.into_iter().flatten().collect();
    let mut ordered: Vec<Option<NodeId>> = Vec::with_capacity(members.len() + 1);
    if has_document {
        ordered.push(None);
    }
    ordered.extend(
        tree.document_order()
            .into_iter()
            .filter(|node| members.contains(node))
            .map(Some),
    );
    ordered
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> Option<PathExpr> {
        self.skip_ws();
        if self.eat("(") {
            let mut inner = self.parse_expr()?;
            if !self.eat(")") || !inner.group_predicates.is_empty() {
                return None;
            }
            inner.group_predicates = self.parse_predicates()?;
            return Some(inner);
        }
        Some(PathExpr {
            steps: self.parse_location_path()?,
            group_predicates: Vec::new(),
        })
    }

    fn parse_location_path(&mut self) -> Option<Vec<Step>> {
        let mut steps = Vec::new();
        loop {
            self.skip_ws();
            let axis = if self.eat("//") {
                Axis::Descendant
            } else if self.eat("/") {
                Axis::Child
            } else {
                break;
            };
            steps.push(self.parse_step(axis)?);
        }
        (!steps.is_empty()).then_some(steps)
    }

    fn parse_step(&mut self, axis: Axis) -> Option<Step> {
        self.skip_ws();
        let kind = if self.eat("..") {
            StepKind::Parent
        } else if self.eat(".") {
            StepKind::SelfNode
        } else if self.eat("*") {
            StepKind::Any
        } else {
            StepKind::Name(self.parse_name()?)
        };
        let predicates = self.parse_predicates()?;
        Some(Step {
            axis,
            kind,
            predicates,
        })
    }

    fn parse_predicates(&mut self) -> Option<Vec<Predicate>> {
        let mut predicates = Vec::new();
        while self.eat("[") {
            let mut parts = vec![self.parse_predicate_term()?];
            while self.eat_keyword("and") {
                parts.push(self.parse_predicate_term()?);
            }
            if !self.eat("]") {
                return None;
            }
            predicates.push(if parts.len() == 1 {
                parts.remove(0)
            } else {
                Predicate::And(parts)
            });
        }
        Some(predicates)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        let boundary = rest
            .as_bytes()
            .get(keyword.len())
            .map_or(true, |b| !is_name_char(*b));
        if rest.starts_with(keyword) && boundary {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn parse_predicate_term(&mut self) -> Option<Predicate> {
        self.skip_ws();
        if let Some(number) = self.parse_number() {
            return (number > 0).then_some(Predicate::Position(number));
        }
        if self.eat("last()") {
            return Some(Predicate::Last);
        }
        for (function, build) in [
            ("contains(", Predicate::Contains as fn(Operand, String) -> Predicate),
            ("starts-with(", Predicate::StartsWith as fn(Operand, String) -> Predicate),
        ] {
            if self.eat(function) {
                let operand = self.parse_operand()?;
                if !self.eat(",") {
                    return None;
                }
                let literal = self.parse_literal()?;
                if !self.eat(")") {
                    return None;
                }
                return Some(build(operand, literal));
            }
        }

        let operand = self.parse_operand()?;
        if self.eat("=") {
            let literal = self.parse_literal()?;
            return Some(Predicate::Equals(operand, literal));
        }
        Some(Predicate::Exists(operand))
    }

    fn parse_operand(&mut self) -> Option<Operand> {
        self.skip_ws();
        if self.eat("@") {
            return Some(Operand::Attr(self.parse_name()?.to_ascii_lowercase()));
        }
        if self.eat("text()") {
            return Some(Operand::Text);
        }
        if self.eat(".") {
            return Some(Operand::Context);
        }
        None
    }

    fn parse_name(&mut self) -> Option<String> {
        self.skip_ws();
        let len = self
            .rest()
            .bytes()
            .take_while(|b| is_name_char(*b))
            .count();
        if len == 0 {
            return None;
        }
        let name = self.rest()[..len].to_string();
        self.pos += len;
        Some(name)
    }

    fn parse_number(&mut self) -> Option<usize> {
        let len = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return None;
        }
        let number = self.rest()[..len].parse().ok()?;
        self.pos += len;
        Some(number)
    }

    fn parse_literal(&mut self) -> Option<String> {
        self.skip_ws();
        let quote = self.rest().chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let body = &self.rest()[1..];
        let close = body.find(quote)?;
        let literal = body[..close].to_string();
        self.pos += close + 2;
        Some(literal)
    }
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_descendant_with_predicates() {
        let expr = PathExpr::parse("//div[@class='item' and contains(text(),'A')][2]").unwrap();
        assert_eq!(expr.steps.len(), 1);
        let step = &expr.steps[0];
        assert_eq!(step.axis, Axis::Descendant);
        assert_eq!(step.kind, StepKind::Name("div".into()));
        assert_eq!(step.predicates.len(), 2);
        assert_eq!(step.predicates[1], Predicate::Position(2));
    }

    #[test]
    fn parses_grouped_expression() {
        let expr = PathExpr::parse("(//li)[last()]").unwrap();
        assert_eq!(expr.group_predicates, vec![Predicate::Last]);
    }

    #[test]
    fn rejects_unsupported_syntax() {
        for bad in ["", "div", "//", "//a[", "//a[0]", "(//a", "//a | //b", "//a[@x=1]"] {
            assert!(
                matches!(PathExpr::parse(bad), Err(DomError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
    }
}
