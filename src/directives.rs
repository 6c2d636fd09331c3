use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Comment, CommentKind, SourceRange};
use crate::config::{GlobalValue, RuleEntry, Severity};
use crate::source_code::SourceCode;
use crate::violation::LintMessage;

static DIRECTIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(eslint(?:-disable(?:-next-line|-line)?|-enable|-env)?|globals?|exported)\b")
        .unwrap()
});

static JUSTIFICATION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s--\s").unwrap());

static BARE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([,{]\s*)([A-Za-z0-9_$@/\-]+)\s*:"#).unwrap());

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisableDirectiveKind {
    Disable,
    Enable,
    DisableLine,
    DisableNextLine,
}

impl DisableDirectiveKind {
    pub fn is_line_scoped(self) -> bool {
        matches!(self, Self::DisableLine | Self::DisableNextLine)
    }
}

#[derive(Clone, Debug)]
pub struct DisableDirective {
    pub kind: DisableDirectiveKind,
    /// For block directives, where the directive takes effect; for
    /// line directives, the single line it covers.
    pub line: usize,
    pub column: usize,
    /// `None` means all rules.
    pub rule_ids: Option<Vec<String>>,
    pub justification: Option<String>,
    pub comment_range: SourceRange,
    pub comment_line: usize,
    pub comment_column: usize,
}

/// A rule override from an inline `/* eslint rule: ... */` comment,
/// positioned for diagnostics against unknown rule ids.
#[derive(Clone, Debug)]
pub struct InlineRuleConfig {
    pub rule_id: String,
    pub entry: RuleEntry,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Default)]
pub struct DirectiveParseOutput {
    pub disable_directives: Vec<DisableDirective>,
    pub rule_configs: Vec<InlineRuleConfig>,
    pub globals: Vec<(String, GlobalValue)>,
    pub exported: Vec<String>,
    pub envs: Vec<String>,
    pub problems: Vec<LintMessage>,
}

fn directive_problem(comment: &Comment, message: String) -> LintMessage {
    LintMessage {
        rule_id: None,
        severity: Severity::Error,
        message,
        message_id: None,
        line: comment.loc.start.line,
        column: comment.loc.start.column + 1,
        end_line: Some(comment.loc.end.line),
        end_column: Some(comment.loc.end.column + 1),
        node_type: None,
        fix: None,
        suggestions: Default::default(),
        fatal: false,
        suppressions: Default::default(),
    }
}

fn split_justification(text: &str) -> (&str, Option<String>) {
    match JUSTIFICATION_PATTERN.find(text) {
        Some(found) => (
            &text[..found.start()],
            Some(text[found.end()..].trim().to_owned()),
        ),
        None => (text, None),
    }
}

fn parse_rule_list(text: &str) -> Option<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(
        text.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}

/// JSON-ish rule configuration: bare keys are quoted, then
/// `serde_json` decides.
fn parse_json_config(text: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let wrapped = format!("{{{}}}", text.trim());
    let attempt = serde_json::from_str(&wrapped);
    let value: serde_json::Value = match attempt {
        Ok(value) => value,
        Err(_) => {
            let repaired = BARE_KEY_PATTERN.replace_all(&wrapped, "$1\"$2\":");
            serde_json::from_str(repaired.as_ref()).map_err(|error| error.to_string())?
        }
    };
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err("expected an object".to_owned()),
    }
}

/// Reads every non-shebang comment and extracts directive records,
/// inline configuration and the problems their misuse produces.
pub fn parse_directives(source_code: &SourceCode) -> DirectiveParseOutput {
    let mut output = DirectiveParseOutput::default();

    for comment in source_code.tokens().all_comments() {
        if comment.kind == CommentKind::Shebang {
            continue;
        }
        let Some(captures) = DIRECTIVE_PATTERN.captures(&comment.value) else {
            continue;
        };
        let keyword = captures.get(1).unwrap().as_str().to_owned();
        let rest = &comment.value[captures.get(0).unwrap().end()..];
        let (text, justification) = split_justification(rest);

        match &*keyword {
            "eslint-disable-line" | "eslint-disable-next-line" => {
                let kind = if keyword == "eslint-disable-line" {
                    DisableDirectiveKind::DisableLine
                } else {
                    DisableDirectiveKind::DisableNextLine
                };
                if kind == DisableDirectiveKind::DisableLine
                    && comment.loc.start.line != comment.loc.end.line
                {
                    output.problems.push(directive_problem(
                        comment,
                        format!("{keyword} comment should not span multiple lines."),
                    ));
                    continue;
                }
                let line = match kind {
                    DisableDirectiveKind::DisableLine => comment.loc.start.line,
                    _ => comment.loc.end.line + 1,
                };
                output.disable_directives.push(DisableDirective {
                    kind,
                    line,
                    column: 1,
                    rule_ids: parse_rule_list(text),
                    justification,
                    comment_range: comment.range,
                    comment_line: comment.loc.start.line,
                    comment_column: comment.loc.start.column + 1,
                });
            }
            // The remaining directives only make sense in block
            // comments; in line comments they stay plain text.
            _ if comment.kind == CommentKind::Line => {}
            "eslint-disable" | "eslint-enable" => {
                let kind = if keyword == "eslint-disable" {
                    DisableDirectiveKind::Disable
                } else {
                    DisableDirectiveKind::Enable
                };
                output.disable_directives.push(DisableDirective {
                    kind,
                    line: comment.loc.start.line,
                    column: comment.loc.start.column + 1,
                    rule_ids: parse_rule_list(text),
                    justification,
                    comment_range: comment.range,
                    comment_line: comment.loc.start.line,
                    comment_column: comment.loc.start.column + 1,
                });
            }
            "eslint" => match parse_json_config(text) {
                Ok(map) => {
                    for (rule_id, value) in map {
                        match RuleEntry::from_config_value(&value) {
                            Some(entry) => output.rule_configs.push(InlineRuleConfig {
                                rule_id,
                                entry,
                                line: comment.loc.start.line,
                                column: comment.loc.start.column + 1,
                            }),
                            None => output.problems.push(directive_problem(
                                comment,
                                format!(
                                    "Inline configuration for rule {rule_id:?} is invalid: {value}"
                                ),
                            )),
                        }
                    }
                }
                Err(error) => output.problems.push(directive_problem(
                    comment,
                    format!("Failed to parse JSON from {:?}: {error}", text.trim()),
                )),
            },
            "global" | "globals" => {
                for part in text.split(',') {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    match part.split_once(':') {
                        Some((name, value)) => match GlobalValue::parse(value) {
                            Some(parsed) => {
                                output.globals.push((name.trim().to_owned(), parsed));
                            }
                            None => output.problems.push(directive_problem(
                                comment,
                                format!(
                                    "'{}' is not a valid configuration for a global (use 'readonly', 'writable', or 'off')",
                                    value.trim()
                                ),
                            )),
                        },
                        None => {
                            output.globals.push((part.to_owned(), GlobalValue::Readonly));
                        }
                    }
                }
            }
            "exported" => {
                output.exported.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_owned),
                );
            }
            "eslint-env" => {
                output.envs.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_owned),
                );
            }
            _ => {}
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use crate::ast::{Position, SourceLocation};
    use crate::source_code::ParseResult;

    use super::*;

    fn source_with_comments(text: &str, comments: Vec<Comment>) -> SourceCode {
        let mut builder = crate::ast::AstBuilder::default();
        let program = builder.add_node(
            "Program",
            SourceRange::new(0, text.len()),
            SourceLocation::default(),
        );
        SourceCode::new(
            text,
            ParseResult {
                ast: builder.finish(program),
                tokens: Default::default(),
                comments,
                visitor_keys: None,
                scope_manager: None,
                services: Default::default(),
            },
        )
    }

    fn line_comment(value: &str, line: usize, start: usize) -> Comment {
        Comment {
            kind: CommentKind::Line,
            value: value.to_owned(),
            range: SourceRange::new(start, start + value.len() + 2),
            loc: SourceLocation::new(
                Position::new(line, 0),
                Position::new(line, value.len() + 2),
            ),
        }
    }

    fn block_comment(value: &str, line: usize, end_line: usize, start: usize) -> Comment {
        Comment {
            kind: CommentKind::Block,
            value: value.to_owned(),
            range: SourceRange::new(start, start + value.len() + 4),
            loc: SourceLocation::new(
                Position::new(line, 0),
                Position::new(end_line, value.len() + 4),
            ),
        }
    }

    #[test]
    fn test_disable_next_line_with_rule_list() {
        let source = source_with_comments(
            "// eslint-disable-next-line no-var, semi\nvar x=1;\n",
            vec![line_comment(" eslint-disable-next-line no-var, semi", 1, 0)],
        );
        let output = parse_directives(&source);
        assert_eq!(output.disable_directives.len(), 1);
        let directive = &output.disable_directives[0];
        assert_eq!(directive.kind, DisableDirectiveKind::DisableNextLine);
        assert_eq!(directive.line, 2);
        assert_eq!(
            directive.rule_ids.as_deref(),
            Some(&["no-var".to_owned(), "semi".to_owned()][..])
        );
    }

    #[test]
    fn test_justification_split() {
        let source = source_with_comments(
            "/* eslint-disable no-var -- legacy file */\n",
            vec![block_comment(" eslint-disable no-var -- legacy file ", 1, 1, 0)],
        );
        let output = parse_directives(&source);
        let directive = &output.disable_directives[0];
        assert_eq!(directive.rule_ids.as_deref().unwrap()[0], "no-var");
        assert_eq!(directive.justification.as_deref(), Some("legacy file"));
    }

    #[test]
    fn test_empty_rule_list_means_all() {
        let source = source_with_comments(
            "/* eslint-disable */\n",
            vec![block_comment(" eslint-disable ", 1, 1, 0)],
        );
        let output = parse_directives(&source);
        assert!(output.disable_directives[0].rule_ids.is_none());
    }

    #[test]
    fn test_multi_line_disable_line_is_rejected() {
        let source = source_with_comments(
            "/* eslint-disable-line\n*/\n",
            vec![block_comment(" eslint-disable-line\n", 1, 2, 0)],
        );
        let output = parse_directives(&source);
        assert!(output.disable_directives.is_empty());
        assert_eq!(output.problems.len(), 1);
        assert!(output.problems[0]
            .message
            .contains("should not span multiple lines"));
    }

    #[test]
    fn test_block_directives_ignored_in_line_comments() {
        let source = source_with_comments(
            "// eslint-disable no-var\n",
            vec![line_comment(" eslint-disable no-var", 1, 0)],
        );
        let output = parse_directives(&source);
        assert!(output.disable_directives.is_empty());
        assert!(output.problems.is_empty());
    }

    #[test]
    fn test_inline_rule_config() {
        let source = source_with_comments(
            "/* eslint no-var: 2, semi: [\"error\", \"always\"] */\n",
            vec![block_comment(
                " eslint no-var: 2, semi: [\"error\", \"always\"] ",
                1,
                1,
                0,
            )],
        );
        let output = parse_directives(&source);
        assert_eq!(output.rule_configs.len(), 2);
        let semi = output
            .rule_configs
            .iter()
            .find(|config| config.rule_id == "semi")
            .unwrap();
        assert_eq!(semi.entry.severity, Severity::Error);
        assert_eq!(semi.entry.options, vec![serde_json::json!("always")]);
    }

    #[test]
    fn test_invalid_inline_config_is_a_problem() {
        let source = source_with_comments(
            "/* eslint no-var: {{{ */\n",
            vec![block_comment(" eslint no-var: {{{ ", 1, 1, 0)],
        );
        let output = parse_directives(&source);
        assert!(output.rule_configs.is_empty());
        assert_eq!(output.problems.len(), 1);
        assert!(output.problems[0].message.contains("Failed to parse JSON"));
    }

    #[test]
    fn test_globals_with_values() {
        let source = source_with_comments(
            "/* globals foo: writable, bar: readonly, baz, qux: nonsense */\n",
            vec![block_comment(
                " globals foo: writable, bar: readonly, baz, qux: nonsense ",
                1,
                1,
                0,
            )],
        );
        let output = parse_directives(&source);
        assert_eq!(
            output.globals,
            vec![
                ("foo".to_owned(), GlobalValue::Writable),
                ("bar".to_owned(), GlobalValue::Readonly),
                ("baz".to_owned(), GlobalValue::Readonly),
            ]
        );
        assert_eq!(output.problems.len(), 1);
    }

    #[test]
    fn test_env_and_exported_lists() {
        let source = source_with_comments(
            "/* eslint-env node, browser */ /* exported a, b */\n",
            vec![
                block_comment(" eslint-env node, browser ", 1, 1, 0),
                block_comment(" exported a, b ", 1, 1, 30),
            ],
        );
        let output = parse_directives(&source);
        assert_eq!(output.envs, vec!["node".to_owned(), "browser".to_owned()]);
        assert_eq!(output.exported, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_non_directive_comments_ignored() {
        let source = source_with_comments(
            "// just a note about eslint-disable\n",
            vec![line_comment(" just a note about eslint-disable", 1, 0)],
        );
        let output = parse_directives(&source);
        assert!(output.disable_directives.is_empty());
        assert!(output.problems.is_empty());
    }
}
