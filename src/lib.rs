mod apply_disable_directives;
mod ast;
mod code_path_analysis;
mod config;
mod context;
mod directives;
mod errors;
mod event_emitter;
mod fixing;
mod linter;
mod node_event_generator;
mod rule;
mod rule_tester;
mod rules;
mod schema;
mod scope;
mod selectors;
mod source_code;
#[cfg(test)]
mod tests;
mod token_store;
mod traverser;
mod violation;

pub use apply_disable_directives::{apply_disable_directives, ApplyDisableDirectivesOptions};
pub use ast::{
    is_function_kind, Ast, AstBuilder, Comment, CommentKind, NodeChild, NodeData, NodeId,
    Position, SourceLocation, SourceRange, Token, TokenKind, VisitorKeys,
};
pub use code_path_analysis::{
    CodePath, CodePathAnalyzer, CodePathEvent, CodePathSegment, PathId, SegmentId,
};
pub use config::{
    lookup_environment, EcmaVersion, Environment, GlobalValue, LanguageOptions, LintConfig,
    LintConfigBuilder, RuleEntry, Severity, SourceType,
};
pub use context::RuleContext;
pub use directives::{
    parse_directives, DirectiveParseOutput, DisableDirective, DisableDirectiveKind,
    InlineRuleConfig,
};
pub use errors::LinterError;
pub use event_emitter::{
    is_code_path_event, EventEmitter, EventPayload, Listener, CODE_PATH_EVENTS,
};
pub use fixing::{FixResult, RuleFixer};
pub use linter::{
    CodeBlock, FixReport, FixSelector, Linter, SourceInput, VerifyOptions, VerifyOptionsBuilder,
};
pub use node_event_generator::NodeEventGenerator;
pub use rule::{
    Fixable, Rule, RuleBuilder, RuleCreateFn, RuleDocs, RuleDocsBuilder, RuleListener,
    RuleListenerBuilder, RuleListenerCallback, RuleMeta, RuleMetaBuilder, RuleType,
};
pub use rule_tester::{
    RuleTestExpectedError, RuleTestExpectedErrorBuilder, RuleTestInvalid, RuleTestInvalidBuilder,
    RuleTestValid, RuleTestValidBuilder, RuleTester, RuleTests,
};
pub use rules::{
    no_debugger_rule, no_empty_rule, no_unreachable_rule, no_var_rule, semi_rule, RuleRegistry,
};
pub use schema::{validate_rule_options, validate_schema};
pub use scope::{Reference, Scope, ScopeId, ScopeKind, ScopeManager, Variable};
pub use selectors::{parse_selector, ParsedSelector};
pub use source_code::{LineIndex, ParseError, ParseResult, Parser, SourceCode};
pub use token_store::{
    CountOptions, CountOptionsBuilder, Cursor, SkipOptions, SkipOptionsBuilder, TokenFilter,
    TokenOrComment, TokenStore,
};
pub use traverser::{walk_ast, AstVisitor, VisitAction};
pub use violation::{
    Fix, FixerCallback, LintMessage, LintSuggestion, SuggestionDescriptor, Suppression, Violation,
    ViolationBuilder,
};
