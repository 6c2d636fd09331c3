use std::cell::{Cell, RefCell};
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use std::collections::BTreeMap;

use crate::ast::{NodeId, SourceLocation};
use crate::config::{GlobalValue, LanguageOptions, Severity};
use crate::errors::LinterError;
use crate::fixing::{merge_fixes, RuleFixer};
use crate::rule::RuleMeta;
use crate::scope::{Scope, ScopeId, Variable};
use crate::source_code::SourceCode;
use crate::violation::{Fix, LintMessage, LintSuggestion, Violation};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_$]+)\s*\}\}").unwrap());

/// Substitutes `{{name}}` placeholders; unmatched placeholders stay
/// literal.
fn interpolate(template: &str, data: &std::collections::HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let name = &captures[1];
            data.get(name)
                .cloned()
                .unwrap_or_else(|| captures[0].to_owned())
        })
        .into_owned()
}

/// Everything a rule sees while linting one file. One context is
/// vended per rule; reports funnel into the shared sink, machinery
/// misuse lands in `failure` and aborts the run with the rule id
/// attached.
pub struct RuleContext {
    rule_id: String,
    meta: RuleMeta,
    severity: Severity,
    options: Vec<Value>,
    settings: Rc<serde_json::Map<String, Value>>,
    language_options: Rc<LanguageOptions>,
    globals: Rc<BTreeMap<String, GlobalValue>>,
    filename: Rc<str>,
    source_code: Rc<SourceCode>,
    ancestors: Rc<RefCell<Vec<NodeId>>>,
    current_node: Rc<Cell<Option<NodeId>>>,
    sink: Rc<RefCell<Vec<LintMessage>>>,
    failure: Rc<RefCell<Option<LinterError>>>,
    disable_fixes: bool,
}

impl RuleContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rule_id: String,
        meta: RuleMeta,
        severity: Severity,
        options: Vec<Value>,
        settings: Rc<serde_json::Map<String, Value>>,
        language_options: Rc<LanguageOptions>,
        globals: Rc<BTreeMap<String, GlobalValue>>,
        filename: Rc<str>,
        source_code: Rc<SourceCode>,
        ancestors: Rc<RefCell<Vec<NodeId>>>,
        current_node: Rc<Cell<Option<NodeId>>>,
        sink: Rc<RefCell<Vec<LintMessage>>>,
        failure: Rc<RefCell<Option<LinterError>>>,
        disable_fixes: bool,
    ) -> Self {
        Self {
            rule_id,
            meta,
            severity,
            options,
            settings,
            language_options,
            globals,
            filename,
            source_code,
            ancestors,
            current_node,
            sink,
            failure,
            disable_fixes,
        }
    }

    pub fn id(&self) -> &str {
        &self.rule_id
    }

    pub fn options(&self) -> &[Value] {
        &self.options
    }

    pub fn settings(&self) -> &serde_json::Map<String, Value> {
        &self.settings
    }

    pub fn language_options(&self) -> &LanguageOptions {
        &self.language_options
    }

    /// Globals in effect for this file: environments, config and
    /// inline `/* global */` directives merged.
    pub fn globals(&self) -> &BTreeMap<String, GlobalValue> {
        &self.globals
    }

    pub fn parser_services(&self) -> &serde_json::Map<String, Value> {
        self.source_code.parser_services()
    }

    pub fn source_code(&self) -> &SourceCode {
        &self.source_code
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Ancestors of the node currently being visited, root first.
    pub fn get_ancestors(&self) -> Vec<NodeId> {
        self.ancestors.borrow().clone()
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node.get()
    }

    /// The innermost scope containing the current node.
    pub fn get_scope(&self) -> &Scope {
        let id = self.get_scope_id();
        self.source_code.scope_manager().scope(id)
    }

    pub fn get_scope_id(&self) -> ScopeId {
        match self.current_node.get() {
            Some(node) => self.source_code.innermost_scope_for(node),
            None => self.source_code.scope_manager().global_scope(),
        }
    }

    /// Variables declared by the given node (its declarators, params
    /// or function name).
    pub fn get_declared_variables(&self, node: NodeId) -> Vec<&Variable> {
        self.source_code
            .scope_manager()
            .scopes()
            .flat_map(|(_, scope)| &scope.variables)
            .filter(|variable| variable.def_nodes.contains(&node))
            .collect()
    }

    /// Marks the named variable as used, searching upward from the
    /// innermost scope. Returns whether a variable was found.
    pub fn mark_variable_as_used(&self, name: &str) -> bool {
        self.source_code
            .scope_manager()
            .mark_variable_as_used(name, self.get_scope_id())
    }

    pub fn report(&self, violation: Violation) {
        if self.failure.borrow().is_some() {
            return;
        }
        match self.build_message(violation) {
            Ok(message) => self.sink.borrow_mut().push(message),
            Err(error) => *self.failure.borrow_mut() = Some(error),
        }
    }

    pub(crate) fn take_failure(&self) -> Option<LinterError> {
        self.failure.borrow_mut().take()
    }

    fn rule_error<T>(&self, make: impl FnOnce(String) -> LinterError) -> Result<T, LinterError> {
        Err(make(self.rule_id.clone()))
    }

    fn build_message(&self, violation: Violation) -> Result<LintMessage, LinterError> {
        let node_type = violation
            .node
            .map(|node| self.source_code.node(node).kind().to_owned());
        let loc: SourceLocation = match (violation.loc, violation.node) {
            (Some(loc), _) => loc,
            (None, Some(node)) => self.source_code.node(node).loc(),
            (None, None) => {
                return self.rule_error(|rule_id| LinterError::MissingReportLocation { rule_id })
            }
        };

        let template = match (&violation.message, &violation.message_id) {
            (Some(message), _) => message.clone(),
            (None, Some(message_id)) => match self.meta.messages.get(message_id) {
                Some(template) => template.clone(),
                None => {
                    return self.rule_error(|rule_id| LinterError::UnknownMessageId {
                        rule_id,
                        message_id: message_id.clone(),
                    })
                }
            },
            (None, None) => {
                return self.rule_error(|rule_id| LinterError::MissingReportMessage { rule_id })
            }
        };
        let message = interpolate(&template, &violation.data);

        let fix = match &violation.fix {
            Some(callback) => {
                if self.meta.fixable.is_none() {
                    return self.rule_error(|rule_id| LinterError::UndeclaredFix { rule_id });
                }
                if self.disable_fixes {
                    None
                } else {
                    let mut fixer = RuleFixer::new(&self.source_code);
                    (**callback)(&mut fixer);
                    let fix = match merge_fixes(fixer.into_fixes(), self.source_code.text()) {
                        Ok(fix) => fix,
                        Err(()) => {
                            return self
                                .rule_error(|rule_id| LinterError::ConflictingFix { rule_id })
                        }
                    };
                    // Fixes reaching outside the reported node are
                    // permitted, only traced.
                    if let (Some(fix), Some(node)) = (&fix, violation.node) {
                        let node_range = self.source_code.node(node).range();
                        if !node_range.contains(fix.range) {
                            tracing::debug!(
                                rule_id = %self.rule_id,
                                "fix range escapes the reported node"
                            );
                        }
                    }
                    fix
                }
            }
            None => None,
        };

        let suggestions = self.build_suggestions(&violation)?;

        Ok(LintMessage {
            rule_id: Some(self.rule_id.clone()),
            severity: self.severity,
            message,
            message_id: violation.message_id.clone(),
            line: loc.start.line,
            column: loc.start.column + 1,
            end_line: Some(loc.end.line),
            end_column: Some(loc.end.column + 1),
            node_type,
            fix,
            suggestions,
            fatal: false,
            suppressions: Default::default(),
        })
    }

    fn build_suggestions(&self, violation: &Violation) -> Result<Vec<LintSuggestion>, LinterError> {
        if violation.suggest.is_empty() {
            return Ok(Vec::new());
        }
        if !self.meta.has_suggestions {
            return self.rule_error(|rule_id| LinterError::UndeclaredSuggestions { rule_id });
        }
        let mut suggestions = Vec::with_capacity(violation.suggest.len());
        for descriptor in &violation.suggest {
            let template = match (&descriptor.description, &descriptor.message_id) {
                (Some(description), _) => description.clone(),
                (None, Some(message_id)) => match self.meta.messages.get(message_id) {
                    Some(template) => template.clone(),
                    None => {
                        return self.rule_error(|rule_id| LinterError::UnknownMessageId {
                            rule_id,
                            message_id: message_id.clone(),
                        })
                    }
                },
                (None, None) => {
                    return self.rule_error(|rule_id| LinterError::MissingReportMessage { rule_id })
                }
            };
            let mut fixer = RuleFixer::new(&self.source_code);
            (*descriptor.fix)(&mut fixer);
            let fix: Option<Fix> = match merge_fixes(fixer.into_fixes(), self.source_code.text()) {
                Ok(fix) => fix,
                Err(()) => {
                    return self.rule_error(|rule_id| LinterError::ConflictingFix { rule_id })
                }
            };
            let Some(fix) = fix else {
                return self.rule_error(|rule_id| LinterError::SuggestionWithoutFix { rule_id });
            };
            suggestions.push(LintSuggestion {
                description: interpolate(&template, &descriptor.data),
                message_id: descriptor.message_id.clone(),
                fix,
            });
        }
        Ok(suggestions)
    }
}
