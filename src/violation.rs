use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use derive_builder::Builder;
use serde::Serialize;

use crate::ast::{NodeId, SourceLocation, SourceRange};
use crate::config::Severity;
use crate::fixing::RuleFixer;

/// A textual edit: replace `source[range.start..range.end]` with
/// `text`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub range: SourceRange,
    pub text: String,
}

/// An advisory fix requiring explicit user selection; never applied
/// automatically.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintSuggestion {
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub fix: Fix,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suppression {
    pub kind: String,
    pub justification: String,
}

/// One reported finding, in the stable output shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub line: usize,
    /// 1-based, unlike the 0-based positions on tokens and nodes.
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<LintSuggestion>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppressions: Vec<Suppression>,
}

impl LintMessage {
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    pub fn is_suppressed(&self) -> bool {
        !self.suppressions.is_empty()
    }
}

pub type FixerCallback = Rc<dyn Fn(&mut RuleFixer<'_>)>;

#[derive(Clone)]
pub struct SuggestionDescriptor {
    pub message_id: Option<String>,
    pub description: Option<String>,
    pub data: HashMap<String, String>,
    pub fix: FixerCallback,
}

impl SuggestionDescriptor {
    pub fn new(
        message_id: impl Into<String>,
        fix: impl Fn(&mut RuleFixer<'_>) + 'static,
    ) -> Self {
        Self {
            message_id: Some(message_id.into()),
            description: None,
            data: Default::default(),
            fix: Rc::new(fix),
        }
    }

    pub fn with_description(
        description: impl Into<String>,
        fix: impl Fn(&mut RuleFixer<'_>) + 'static,
    ) -> Self {
        Self {
            message_id: None,
            description: Some(description.into()),
            data: Default::default(),
            fix: Rc::new(fix),
        }
    }
}

/// What a rule hands to `report`: a node or an explicit location, a
/// message or a message id with interpolation data, and optionally a
/// lazy fix and suggestions.
#[derive(Builder, Clone)]
#[builder(setter(into, strip_option), default)]
pub struct Violation {
    pub node: Option<NodeId>,
    pub loc: Option<SourceLocation>,
    pub message: Option<String>,
    pub message_id: Option<String>,
    pub data: HashMap<String, String>,
    #[builder(setter(custom))]
    pub fix: Option<FixerCallback>,
    pub suggest: Vec<SuggestionDescriptor>,
}

impl Default for Violation {
    fn default() -> Self {
        Self {
            node: None,
            loc: None,
            message: None,
            message_id: None,
            data: Default::default(),
            fix: None,
            suggest: Default::default(),
        }
    }
}

impl fmt::Debug for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Violation")
            .field("node", &self.node)
            .field("loc", &self.loc)
            .field("message", &self.message)
            .field("message_id", &self.message_id)
            .field("has_fix", &self.fix.is_some())
            .field("suggestions", &self.suggest.len())
            .finish()
    }
}

impl ViolationBuilder {
    pub fn fix(&mut self, callback: impl Fn(&mut RuleFixer<'_>) + 'static) -> &mut Self {
        self.fix = Some(Some(Rc::new(callback)));
        self
    }
}
