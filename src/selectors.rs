use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

use crate::ast::{Ast, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Combinator {
    Child,
    Descendant,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrOp {
    Exists,
    Equal,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeTest {
    pub path: String,
    pub op: AttrOp,
    pub value: Option<AttrValue>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compound {
    pub kind: Option<String>,
    pub attributes: Vec<AttributeTest>,
}

/// A compiled selector: compounds joined by child/descendant
/// combinators, with the rightmost compound as the subject.
#[derive(Clone, Debug)]
pub struct ParsedSelector {
    raw: String,
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
    is_exit: bool,
    attribute_count: usize,
    identifier_count: usize,
}

impl ParsedSelector {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_exit(&self) -> bool {
        self.is_exit
    }

    /// Node kind the subject is pinned to, for dispatch bucketing.
    /// `None` for wildcard subjects.
    pub fn target_kind(&self) -> Option<&str> {
        self.compounds.last().and_then(|compound| compound.kind.as_deref())
    }

    /// Specificity: attribute tests outrank identifiers; more tests
    /// outrank fewer.
    pub fn specificity(&self) -> (usize, usize) {
        (self.attribute_count, self.identifier_count)
    }

    pub fn matches(&self, ast: &Ast, node: NodeId, ancestors: &[NodeId]) -> bool {
        let subject_index = self.compounds.len() - 1;
        if !compound_matches(ast, node, &self.compounds[subject_index]) {
            return false;
        }
        self.match_left(ast, subject_index, ancestors, ancestors.len())
    }

    fn match_left(
        &self,
        ast: &Ast,
        compound_index: usize,
        ancestors: &[NodeId],
        upper: usize,
    ) -> bool {
        if compound_index == 0 {
            return true;
        }
        let next = compound_index - 1;
        match self.combinators[next] {
            Combinator::Child => {
                upper > 0
                    && compound_matches(ast, ancestors[upper - 1], &self.compounds[next])
                    && self.match_left(ast, next, ancestors, upper - 1)
            }
            Combinator::Descendant => (0..upper).rev().any(|position| {
                compound_matches(ast, ancestors[position], &self.compounds[next])
                    && self.match_left(ast, next, ancestors, position)
            }),
        }
    }
}

fn compound_matches(ast: &Ast, node: NodeId, compound: &Compound) -> bool {
    if let Some(kind) = &compound.kind {
        if ast.kind(node) != kind {
            return false;
        }
    }
    compound
        .attributes
        .iter()
        .all(|attribute| attribute_matches(ast, node, attribute))
}

enum PathValue<'a> {
    Scalar(&'a Value),
    Kind(&'a str),
    Node(NodeId),
}

fn resolve_path<'a>(ast: &'a Ast, node: NodeId, path: &str) -> Option<PathValue<'a>> {
    let mut current = node;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let data = ast.node(current);
        if segments.peek().is_none() {
            if segment == "type" {
                return Some(PathValue::Kind(data.kind()));
            }
            if let Some(value) = data.attribute(segment) {
                return Some(PathValue::Scalar(value));
            }
            return data.child(segment).map(PathValue::Node);
        }
        current = data.child(segment)?;
    }
    None
}

fn attribute_matches(ast: &Ast, node: NodeId, attribute: &AttributeTest) -> bool {
    let resolved = resolve_path(ast, node, &attribute.path);
    match attribute.op {
        AttrOp::Exists => resolved.is_some(),
        AttrOp::Equal => resolved
            .map(|value| path_value_equals(&value, attribute.value.as_ref().unwrap()))
            .unwrap_or(false),
        AttrOp::NotEqual => resolved
            .map(|value| !path_value_equals(&value, attribute.value.as_ref().unwrap()))
            .unwrap_or(false),
    }
}

fn path_value_equals(resolved: &PathValue<'_>, expected: &AttrValue) -> bool {
    match (resolved, expected) {
        (PathValue::Kind(kind), AttrValue::String(text)) => kind == text,
        (PathValue::Scalar(Value::String(value)), AttrValue::String(text)) => value == text,
        (PathValue::Scalar(Value::Number(value)), AttrValue::Number(number)) => {
            value.as_f64() == Some(*number)
        }
        (PathValue::Scalar(Value::Bool(value)), AttrValue::Bool(boolean)) => value == boolean,
        (PathValue::Scalar(Value::Null), AttrValue::Null) => true,
        _ => false,
    }
}

pub fn parse_selector(raw: &str) -> Result<ParsedSelector, String> {
    let mut parser = SelectorParser {
        chars: raw.chars().peekable(),
        raw,
    };
    parser.parse()
}

struct SelectorParser<'a> {
    chars: Peekable<Chars<'a>>,
    raw: &'a str,
}

impl SelectorParser<'_> {
    fn parse(&mut self) -> Result<ParsedSelector, String> {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut is_exit = false;

        self.skip_whitespace();
        loop {
            let (compound, exit) = self.parse_compound()?;
            if exit {
                is_exit = true;
            }
            compounds.push(compound);

            let saw_whitespace = self.skip_whitespace();
            match self.chars.peek() {
                None => break,
                Some('>') => {
                    if is_exit {
                        return Err(format!("':exit' must end the selector: {:?}", self.raw));
                    }
                    self.chars.next();
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if saw_whitespace => {
                    if is_exit {
                        return Err(format!("':exit' must end the selector: {:?}", self.raw));
                    }
                    combinators.push(Combinator::Descendant);
                }
                Some(other) => {
                    return Err(format!(
                        "unexpected {other:?} in selector {:?}",
                        self.raw
                    ));
                }
            }
        }

        let attribute_count = compounds
            .iter()
            .map(|compound| compound.attributes.len())
            .sum();
        let identifier_count = compounds
            .iter()
            .filter(|compound| compound.kind.is_some())
            .count();
        Ok(ParsedSelector {
            raw: self.raw.to_owned(),
            compounds,
            combinators,
            is_exit,
            attribute_count,
            identifier_count,
        })
    }

    fn parse_compound(&mut self) -> Result<(Compound, bool), String> {
        let mut compound = Compound::default();
        let mut is_exit = false;
        let mut saw_anything = false;

        if let Some(&ch) = self.chars.peek() {
            if ch == '*' {
                self.chars.next();
                saw_anything = true;
            } else if is_identifier_start(ch) {
                compound.kind = Some(self.parse_identifier());
                saw_anything = true;
            }
        }

        loop {
            match self.chars.peek() {
                Some('[') => {
                    self.chars.next();
                    compound.attributes.push(self.parse_attribute()?);
                    saw_anything = true;
                }
                Some(':') => {
                    self.chars.next();
                    let pseudo = self.parse_identifier();
                    if pseudo != "exit" {
                        return Err(format!(
                            "unsupported pseudo-class :{pseudo} in selector {:?}",
                            self.raw
                        ));
                    }
                    is_exit = true;
                    saw_anything = true;
                }
                _ => break,
            }
        }

        if !saw_anything {
            return Err(format!("expected a selector: {:?}", self.raw));
        }
        Ok((compound, is_exit))
    }

    fn parse_attribute(&mut self) -> Result<AttributeTest, String> {
        self.skip_whitespace();
        let path = self.parse_path();
        if path.is_empty() {
            return Err(format!("expected attribute name in {:?}", self.raw));
        }
        self.skip_whitespace();
        let op = match self.chars.peek() {
            Some(']') => {
                self.chars.next();
                return Ok(AttributeTest {
                    path,
                    op: AttrOp::Exists,
                    value: None,
                });
            }
            Some('=') => {
                self.chars.next();
                AttrOp::Equal
            }
            Some('!') => {
                self.chars.next();
                if self.chars.next() != Some('=') {
                    return Err(format!("expected '!=' in {:?}", self.raw));
                }
                AttrOp::NotEqual
            }
            other => {
                return Err(format!(
                    "unexpected {other:?} in attribute of {:?}",
                    self.raw
                ));
            }
        };
        self.skip_whitespace();
        let value = self.parse_attribute_value()?;
        self.skip_whitespace();
        if self.chars.next() != Some(']') {
            return Err(format!("unterminated attribute in {:?}", self.raw));
        }
        Ok(AttributeTest {
            path,
            op,
            value: Some(value),
        })
    }

    fn parse_attribute_value(&mut self) -> Result<AttrValue, String> {
        match self.chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some(ch) if ch == quote => break,
                        Some('\\') => {
                            if let Some(escaped) = self.chars.next() {
                                text.push(escaped);
                            }
                        }
                        Some(ch) => text.push(ch),
                        None => {
                            return Err(format!("unterminated string in {:?}", self.raw));
                        }
                    }
                }
                Ok(AttrValue::String(text))
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' => {
                let mut text = String::new();
                while let Some(&ch) = self.chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' || ch == '-' {
                        text.push(ch);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                text.parse()
                    .map(AttrValue::Number)
                    .map_err(|_| format!("invalid number {text:?} in {:?}", self.raw))
            }
            Some(ch) if is_identifier_start(ch) => {
                let word = self.parse_identifier();
                Ok(match &*word {
                    "true" => AttrValue::Bool(true),
                    "false" => AttrValue::Bool(false),
                    "null" => AttrValue::Null,
                    // Bare words compare as strings, e.g. [kind=var].
                    _ => AttrValue::String(word),
                })
            }
            other => Err(format!("unexpected {other:?} in {:?}", self.raw)),
        }
    }

    fn parse_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if is_identifier_continue(ch) {
                text.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        text
    }

    fn parse_path(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if is_identifier_continue(ch) || ch == '.' {
                text.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        text
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut saw = false;
        while matches!(self.chars.peek(), Some(ch) if ch.is_whitespace()) {
            self.chars.next();
            saw = true;
        }
        saw
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '-'
}
