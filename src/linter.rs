use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use derive_builder::Builder;
use tracing::{debug, debug_span, instrument};

use crate::apply_disable_directives::{apply_disable_directives, ApplyDisableDirectivesOptions};
use crate::ast::NodeId;
use crate::code_path_analysis::{CodePathAnalyzer, CodePathEvent};
use crate::config::{lookup_environment, GlobalValue, LintConfig, RuleEntry, Severity};
use crate::context::RuleContext;
use crate::directives::parse_directives;
use crate::errors::LinterError;
use crate::event_emitter::{is_code_path_event, EventEmitter, EventPayload};
use crate::fixing::{apply_fixes, MAX_FIX_PASSES};
use crate::node_event_generator::NodeEventGenerator;
use crate::rule::{Rule, RuleListenerCallback};
use crate::rules::RuleRegistry;
use crate::schema::validate_rule_options;
use crate::selectors::parse_selector;
use crate::source_code::SourceCode;
use crate::traverser::{walk_ast, AstVisitor, VisitAction};
use crate::violation::LintMessage;

const DEFAULT_FILENAME: &str = "<input>";

/// Whether `verify_and_fix` applies a message's fix: always, never,
/// or per-problem.
#[derive(Clone, Default)]
pub enum FixSelector {
    #[default]
    Always,
    Never,
    Predicate(Rc<dyn Fn(&LintMessage) -> bool>),
}

impl FixSelector {
    fn accepts(&self, message: &LintMessage) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Predicate(predicate) => predicate(message),
        }
    }
}

impl fmt::Debug for FixSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One chunk a processor carved out of a host file.
#[derive(Clone, Debug)]
pub struct CodeBlock {
    pub text: String,
    pub filename: String,
}

pub type Preprocess = Rc<dyn Fn(&str, &str) -> Vec<CodeBlock>>;
pub type Postprocess = Rc<dyn Fn(Vec<Vec<LintMessage>>, &str) -> Vec<LintMessage>>;
pub type FilterCodeBlock = Rc<dyn Fn(&str, &str) -> bool>;

#[derive(Builder, Clone)]
#[builder(setter(into))]
pub struct VerifyOptions {
    #[builder(default = "DEFAULT_FILENAME.to_owned()")]
    pub filename: String,
    #[builder(default = "true")]
    pub allow_inline_config: bool,
    #[builder(default)]
    pub report_unused_disable_directives: Severity,
    #[builder(default)]
    pub disable_fixes: bool,
    #[builder(setter(custom), default)]
    pub fix: FixSelector,
    #[builder(setter(custom), default)]
    pub preprocess: Option<Preprocess>,
    #[builder(setter(custom), default)]
    pub postprocess: Option<Postprocess>,
    #[builder(setter(custom), default)]
    pub filter_code_block: Option<FilterCodeBlock>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_owned(),
            allow_inline_config: true,
            report_unused_disable_directives: Severity::Off,
            disable_fixes: false,
            fix: FixSelector::Always,
            preprocess: None,
            postprocess: None,
            filter_code_block: None,
        }
    }
}

impl VerifyOptionsBuilder {
    pub fn fix(&mut self, fix: FixSelector) -> &mut Self {
        self.fix = Some(fix);
        self
    }

    pub fn fix_predicate(
        &mut self,
        predicate: impl Fn(&LintMessage) -> bool + 'static,
    ) -> &mut Self {
        self.fix = Some(FixSelector::Predicate(Rc::new(predicate)));
        self
    }

    pub fn preprocess(
        &mut self,
        preprocess: impl Fn(&str, &str) -> Vec<CodeBlock> + 'static,
    ) -> &mut Self {
        self.preprocess = Some(Some(Rc::new(preprocess)));
        self
    }

    pub fn postprocess(
        &mut self,
        postprocess: impl Fn(Vec<Vec<LintMessage>>, &str) -> Vec<LintMessage> + 'static,
    ) -> &mut Self {
        self.postprocess = Some(Some(Rc::new(postprocess)));
        self
    }

    pub fn filter_code_block(
        &mut self,
        filter: impl Fn(&str, &str) -> bool + 'static,
    ) -> &mut Self {
        self.filter_code_block = Some(Some(Rc::new(filter)));
        self
    }
}

/// Raw text (requires a configured parser) or an already-parsed
/// source-code object.
pub enum SourceInput<'a> {
    Text(&'a str),
    Code(Rc<SourceCode>),
}

impl<'a> From<&'a str> for SourceInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl From<Rc<SourceCode>> for SourceInput<'_> {
    fn from(value: Rc<SourceCode>) -> Self {
        Self::Code(value)
    }
}

#[derive(Debug)]
pub struct FixReport {
    pub fixed: bool,
    pub output: String,
    pub messages: Vec<LintMessage>,
}

fn fatal_parse_problem(message: String, line: usize, column: usize) -> LintMessage {
    LintMessage {
        rule_id: None,
        severity: Severity::Error,
        message: format!("Parsing error: {message}"),
        message_id: None,
        line,
        column,
        end_line: None,
        end_column: None,
        node_type: None,
        fix: None,
        suggestions: Default::default(),
        fatal: true,
        suppressions: Default::default(),
    }
}

fn unknown_rule_problem(rule_id: &str, line: usize, column: usize) -> LintMessage {
    let message = match RuleRegistry::replacements(rule_id) {
        Some(replacements) => format!(
            "Rule {rule_id:?} was removed and replaced by: {}",
            replacements.join(", ")
        ),
        None => format!("Definition for rule {rule_id:?} was not found."),
    };
    LintMessage {
        rule_id: Some(rule_id.to_owned()),
        severity: Severity::Error,
        message,
        message_id: None,
        line,
        column,
        end_line: None,
        end_column: None,
        node_type: None,
        fix: None,
        suggestions: Default::default(),
        fatal: false,
        suppressions: Default::default(),
    }
}

fn invalid_options_problem(rule_id: &str, error: &str, line: usize, column: usize) -> LintMessage {
    LintMessage {
        rule_id: Some(rule_id.to_owned()),
        severity: Severity::Error,
        message: format!("Configuration for rule {rule_id:?} is invalid: {error}"),
        message_id: None,
        line,
        column,
        end_line: None,
        end_column: None,
        node_type: None,
        fix: None,
        suggestions: Default::default(),
        fatal: false,
        suppressions: Default::default(),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "rule panicked".to_owned()
    }
}

/// The linting core: wires a parsed file, a rule configuration and
/// the directive machinery into an ordered problem list, and drives
/// the fix loop. Holds no cross-file state beyond the rule registry.
#[derive(Default)]
pub struct Linter {
    registry: RuleRegistry,
}

impl Linter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_rule(&self, rule: Rule) {
        self.registry.define(rule);
    }

    #[instrument(level = "debug", skip_all, fields(filename = %options.filename))]
    pub fn verify(
        &self,
        input: SourceInput<'_>,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        match input {
            SourceInput::Text(text) => {
                if options.preprocess.is_some() {
                    self.verify_with_processor(text, config, options)
                } else {
                    self.verify_text(text, &options.filename, config, options)
                }
            }
            SourceInput::Code(source_code) => self.verify_source_code(source_code, config, options),
        }
    }

    fn verify_with_processor(
        &self,
        text: &str,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        let preprocess = options.preprocess.as_ref().unwrap();
        let blocks = preprocess(text, &options.filename);
        let mut block_results = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            let block_filename = format!("{}/{index}_{}", options.filename, block.filename);
            let skip = options
                .filter_code_block
                .as_ref()
                .is_some_and(|filter| !filter(&block_filename, &block.text));
            if skip {
                block_results.push(Vec::new());
                continue;
            }
            block_results.push(self.verify_text(&block.text, &block_filename, config, options)?);
        }
        Ok(match options.postprocess.as_ref() {
            Some(postprocess) => postprocess(block_results, &options.filename),
            None => block_results.into_iter().flatten().collect(),
        })
    }

    fn verify_text(
        &self,
        text: &str,
        filename: &str,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        let Some(parser) = config.language_options.parser.clone() else {
            return Err(LinterError::MissingParser);
        };
        let stripped = text.strip_prefix('\u{feff}').unwrap_or(text);
        let parse_span = debug_span!("parse", filename).entered();
        let parse_result = parser.parse(stripped, &config.language_options);
        parse_span.exit();
        match parse_result {
            Ok(result) => {
                let source_code = Rc::new(SourceCode::new(text, result));
                self.verify_source_code(source_code, config, options)
            }
            Err(error) => Ok(vec![fatal_parse_problem(
                error.message,
                error.line,
                error.column + 1,
            )]),
        }
    }

    fn verify_source_code(
        &self,
        source_code: Rc<SourceCode>,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        let directive_output = if options.allow_inline_config {
            parse_directives(&source_code)
        } else {
            Default::default()
        };
        let mut problems = directive_output.problems;

        // Inline `/* eslint */` overlays shadow the sealed base config
        // for this file only. Each entry remembers the comment it came
        // from so option-validation problems can point at it.
        let mut rule_entries: BTreeMap<String, (RuleEntry, Option<(usize, usize)>)> = config
            .rules
            .iter()
            .map(|(rule_id, entry)| (rule_id.clone(), (entry.clone(), None)))
            .collect();
        for inline in directive_output.rule_configs {
            if self.registry.get(&inline.rule_id).is_none() {
                problems.push(unknown_rule_problem(
                    &inline.rule_id,
                    inline.line,
                    inline.column,
                ));
                continue;
            }
            rule_entries.insert(inline.rule_id, (inline.entry, Some((inline.line, inline.column))));
        }

        // Environments and globals merge into one map: env < config
        // globals < languageOptions < inline directives.
        let mut globals: BTreeMap<String, GlobalValue> = Default::default();
        for env_name in config.envs.iter().map(String::as_str).chain(
            directive_output.envs.iter().map(String::as_str),
        ) {
            if let Some(environment) = lookup_environment(env_name) {
                globals.extend(
                    environment
                        .globals
                        .iter()
                        .map(|(name, value)| ((*name).to_owned(), *value)),
                );
            }
        }
        globals.extend(config.globals.clone());
        globals.extend(config.language_options.globals.clone());
        globals.extend(directive_output.globals.iter().cloned());
        let globals = Rc::new(globals);

        // `/* exported */` identifiers count as externally referenced.
        for name in &directive_output.exported {
            source_code
                .scope_manager()
                .mark_variable_as_used(name, source_code.scope_manager().global_scope());
        }

        let mut enabled_rule_ids: BTreeSet<String> = Default::default();
        let mut resolved: Vec<(Rc<Rule>, RuleEntry)> = Vec::new();
        for (rule_id, (entry, origin)) in &rule_entries {
            if !entry.is_enabled() {
                continue;
            }
            match self.registry.get(rule_id) {
                Some(rule) => {
                    // Options must satisfy the rule's schema; a failing
                    // rule is skipped, not fatal.
                    if let Err(error) =
                        validate_rule_options(rule.meta.schema.as_ref(), &entry.options)
                    {
                        let (line, column) = origin.unwrap_or((1, 0));
                        problems.push(invalid_options_problem(rule_id, &error, line, column));
                        continue;
                    }
                    enabled_rule_ids.insert(rule_id.clone());
                    resolved.push((rule, entry.clone()));
                }
                None => problems.push(unknown_rule_problem(rule_id, 1, 0)),
            }
        }

        let ancestors: Rc<RefCell<Vec<NodeId>>> = Default::default();
        let current_node: Rc<Cell<Option<NodeId>>> = Default::default();
        let sink: Rc<RefCell<Vec<LintMessage>>> = Default::default();
        let settings = Rc::new(config.settings.clone());
        let language_options = Rc::new(config.language_options.clone());
        let filename: Rc<str> = Rc::from(&*options.filename);

        let mut emitter = EventEmitter::default();
        let mut generator = NodeEventGenerator::default();

        let span = debug_span!("install listeners", rules = resolved.len()).entered();
        for (rule, entry) in &resolved {
            let failure: Rc<RefCell<Option<LinterError>>> = Default::default();
            let context = Rc::new(RuleContext::new(
                rule.name.clone(),
                rule.meta.clone(),
                entry.severity,
                entry.options.clone(),
                settings.clone(),
                language_options.clone(),
                globals.clone(),
                filename.clone(),
                source_code.clone(),
                ancestors.clone(),
                current_node.clone(),
                sink.clone(),
                failure,
                options.disable_fixes,
            ));
            let listeners =
                match catch_unwind(AssertUnwindSafe(|| (rule.create)(&context))) {
                    Ok(listeners) => listeners,
                    Err(payload) => {
                        return Err(LinterError::RuleError {
                            rule_id: rule.name.clone(),
                            line: 1,
                            message: panic_message(payload),
                        });
                    }
                };
            for listener in listeners {
                let event_name = listener.selector.clone();
                let valid = match (&listener.callback, is_code_path_event(&event_name)) {
                    (RuleListenerCallback::Node(_), false) => true,
                    (RuleListenerCallback::CodePath(_), true) => {
                        matches!(&*event_name, "onCodePathStart" | "onCodePathEnd")
                    }
                    (RuleListenerCallback::Segment(_), true) => matches!(
                        &*event_name,
                        "onCodePathSegmentStart" | "onCodePathSegmentEnd"
                    ),
                    (RuleListenerCallback::SegmentLoop(_), true) => {
                        event_name == "onCodePathSegmentLoop"
                    }
                    _ => false,
                };
                if !valid {
                    return Err(LinterError::MismatchedListener {
                        rule_id: rule.name.clone(),
                        event: event_name,
                    });
                }
                if !is_code_path_event(&event_name) {
                    let parsed = parse_selector(&event_name).map_err(|message| {
                        LinterError::InvalidSelector {
                            rule_id: rule.name.clone(),
                            selector: event_name.clone(),
                            message,
                        }
                    })?;
                    let callback = listener.callback.clone();
                    let context = context.clone();
                    emitter.on(event_name.clone(), wrap_listener(callback, context));
                    generator.add(parsed, emitter.registration_index(&event_name));
                } else {
                    let callback = listener.callback.clone();
                    let context = context.clone();
                    emitter.on(event_name, wrap_listener(callback, context));
                }
            }
        }
        span.exit();

        let mut dispatcher = Dispatcher {
            source_code: source_code.clone(),
            emitter,
            generator,
            analyzer: CodePathAnalyzer::new(),
            ancestors,
            current_node,
            error: None,
        };
        let traversal_span = debug_span!("traverse").entered();
        walk_ast(&source_code, &mut dispatcher);
        traversal_span.exit();
        if let Some(error) = dispatcher.error {
            return Err(error);
        }

        problems.extend(sink.borrow_mut().drain(..));
        problems.sort_by_key(LintMessage::position);

        let mut messages = apply_disable_directives(ApplyDisableDirectivesOptions {
            directives: &directive_output.disable_directives,
            problems,
            report_unused: options.report_unused_disable_directives,
            disable_fixes: options.disable_fixes,
            enabled_rules: &enabled_rule_ids,
        });
        messages.retain(|message| !message.is_suppressed());
        debug!(count = messages.len(), "lint finished");
        Ok(messages)
    }

    /// Iterates parse → lint → apply fixes until no fix applies or
    /// the pass cap is reached, then reports against the final text.
    #[instrument(level = "debug", skip_all)]
    pub fn verify_and_fix(
        &self,
        text: &str,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<FixReport, LinterError> {
        let mut current_text = text.to_owned();
        let mut fixed_any = false;
        let mut messages = Vec::new();
        let mut last_pass_applied = false;

        for pass in 0..MAX_FIX_PASSES {
            let _span = debug_span!("fix pass", pass).entered();
            messages = self.verify(SourceInput::Text(&current_text), config, options)?;
            if messages.iter().any(|message| message.fatal) {
                last_pass_applied = false;
                break;
            }
            let result = apply_fixes(&current_text, messages, &|message| {
                options.fix.accepts(message)
            });
            messages = result.messages;
            last_pass_applied = result.fixed;
            if result.fixed {
                fixed_any = true;
                current_text = result.output;
            } else {
                debug!("no fixes applied, leaving fix loop");
                break;
            }
        }

        // The cap was reached while still fixing: report against the
        // final text.
        if last_pass_applied {
            messages = self.verify(SourceInput::Text(&current_text), config, options)?;
        }

        Ok(FixReport {
            fixed: fixed_any,
            output: current_text,
            messages,
        })
    }
}

fn wrap_listener(
    callback: RuleListenerCallback,
    context: Rc<RuleContext>,
) -> Box<dyn Fn(&EventPayload<'_>) -> Result<(), LinterError>> {
    Box::new(move |payload| {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            match (&callback, payload) {
                (RuleListenerCallback::Node(listener), EventPayload::Node { node }) => {
                    (**listener)(&context, *node);
                }
                (
                    RuleListenerCallback::CodePath(listener),
                    EventPayload::CodePath { code_path, node },
                ) => {
                    (**listener)(&context, code_path, *node);
                }
                (
                    RuleListenerCallback::Segment(listener),
                    EventPayload::Segment {
                        code_path,
                        segment,
                        node,
                    },
                ) => {
                    (**listener)(&context, code_path, segment, *node);
                }
                (
                    RuleListenerCallback::SegmentLoop(listener),
                    EventPayload::SegmentLoop {
                        code_path,
                        from,
                        to,
                        node,
                    },
                ) => {
                    (**listener)(&context, code_path, from, to, *node);
                }
                _ => {}
            }
        }));
        if let Err(payload) = outcome {
            let line = context
                .current_node()
                .map(|node| context.source_code().node(node).loc().start.line)
                .unwrap_or(1);
            return Err(LinterError::RuleError {
                rule_id: context.id().to_owned(),
                line,
                message: panic_message(payload),
            });
        }
        match context.take_failure() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    })
}

struct Dispatcher {
    source_code: Rc<SourceCode>,
    emitter: EventEmitter,
    generator: NodeEventGenerator,
    analyzer: CodePathAnalyzer,
    ancestors: Rc<RefCell<Vec<NodeId>>>,
    current_node: Rc<Cell<Option<NodeId>>>,
    error: Option<LinterError>,
}

impl Dispatcher {
    fn emit_code_path_events(&self, events: &[CodePathEvent]) -> Result<(), LinterError> {
        for event in events {
            match *event {
                CodePathEvent::PathStart { path, node } => self.emitter.emit(
                    "onCodePathStart",
                    &EventPayload::CodePath {
                        code_path: self.analyzer.path(path),
                        node,
                    },
                )?,
                CodePathEvent::PathEnd { path, node } => self.emitter.emit(
                    "onCodePathEnd",
                    &EventPayload::CodePath {
                        code_path: self.analyzer.path(path),
                        node,
                    },
                )?,
                CodePathEvent::SegmentStart {
                    path,
                    segment,
                    node,
                } => {
                    let code_path = self.analyzer.path(path);
                    self.emitter.emit(
                        "onCodePathSegmentStart",
                        &EventPayload::Segment {
                            code_path,
                            segment: code_path.segment(segment),
                            node,
                        },
                    )?;
                }
                CodePathEvent::SegmentEnd {
                    path,
                    segment,
                    node,
                } => {
                    let code_path = self.analyzer.path(path);
                    self.emitter.emit(
                        "onCodePathSegmentEnd",
                        &EventPayload::Segment {
                            code_path,
                            segment: code_path.segment(segment),
                            node,
                        },
                    )?;
                }
                CodePathEvent::SegmentLoop {
                    path,
                    from,
                    to,
                    node,
                } => {
                    let code_path = self.analyzer.path(path);
                    self.emitter.emit(
                        "onCodePathSegmentLoop",
                        &EventPayload::SegmentLoop {
                            code_path,
                            from: code_path.segment(from),
                            to: code_path.segment(to),
                            node,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: LinterError) -> VisitAction {
        self.error = Some(error);
        VisitAction::Stop
    }
}

impl AstVisitor for Dispatcher {
    fn enter_node(&mut self, node: NodeId, parent: Option<NodeId>) -> VisitAction {
        let events = self
            .analyzer
            .enter_node(self.source_code.ast(), node, parent);
        if let Err(error) = self.emit_code_path_events(&events) {
            return self.fail(error);
        }
        self.current_node.set(Some(node));
        let result = self.generator.enter_node(
            self.source_code.ast(),
            node,
            &self.ancestors.borrow(),
            &self.emitter,
        );
        if let Err(error) = result {
            return self.fail(error);
        }
        self.ancestors.borrow_mut().push(node);
        VisitAction::Continue
    }

    fn leave_node(&mut self, node: NodeId, parent: Option<NodeId>) -> VisitAction {
        self.ancestors.borrow_mut().pop();
        self.current_node.set(Some(node));
        let result = self.generator.leave_node(
            self.source_code.ast(),
            node,
            &self.ancestors.borrow(),
            &self.emitter,
        );
        if let Err(error) = result {
            return self.fail(error);
        }
        let events = self
            .analyzer
            .leave_node(self.source_code.ast(), node, parent);
        if let Err(error) = self.emit_code_path_events(&events) {
            return self.fail(error);
        }
        VisitAction::Continue
    }
}
