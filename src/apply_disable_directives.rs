use std::collections::{BTreeSet, HashMap, HashSet};

use itertools::Itertools;

use crate::config::Severity;
use crate::directives::{DisableDirective, DisableDirectiveKind};
use crate::violation::{Fix, LintMessage, Suppression};

pub struct ApplyDisableDirectivesOptions<'a> {
    pub directives: &'a [DisableDirective],
    pub problems: Vec<LintMessage>,
    /// Severity for unused-directive reports; `Off` disables them.
    pub report_unused: Severity,
    pub disable_fixes: bool,
    /// Rules enabled by configuration, used to decide whether an
    /// uncovered directive was pointless or just redundant with an
    /// already-off rule.
    pub enabled_rules: &'a BTreeSet<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
struct DirectiveEntry {
    directive_index: usize,
    /// Index into the directive's rule list; `None` for wildcard.
    rule_index: Option<usize>,
}

/// Post-filter over the sorted problem list: annotates suppressed
/// problems and reports directives that suppressed nothing. Stable
/// with respect to same-position problems.
pub fn apply_disable_directives(options: ApplyDisableDirectivesOptions<'_>) -> Vec<LintMessage> {
    let ApplyDisableDirectivesOptions {
        directives,
        mut problems,
        report_unused,
        disable_fixes,
        enabled_rules,
    } = options;

    problems.sort_by_key(LintMessage::position);

    let block_directives: Vec<(usize, &DisableDirective)> = directives
        .iter()
        .enumerate()
        .filter(|(_, directive)| !directive.kind.is_line_scoped())
        .collect();
    let line_directives: Vec<(usize, &DisableDirective)> = directives
        .iter()
        .enumerate()
        .filter(|(_, directive)| directive.kind.is_line_scoped())
        .collect();

    // Active block suppressions: wildcard plus per-rule.
    let mut all_disabled: Option<DirectiveEntry> = None;
    let mut disabled_rules: HashMap<&str, DirectiveEntry> = Default::default();
    let mut used: HashSet<DirectiveEntry> = Default::default();
    let mut next_block = 0usize;

    for problem in &mut problems {
        while next_block < block_directives.len() {
            let (directive_index, directive) = block_directives[next_block];
            if (directive.line, directive.column) > problem.position() {
                break;
            }
            match (directive.kind, &directive.rule_ids) {
                (DisableDirectiveKind::Disable, None) => {
                    all_disabled = Some(DirectiveEntry {
                        directive_index,
                        rule_index: None,
                    });
                    disabled_rules.clear();
                }
                (DisableDirectiveKind::Disable, Some(rule_ids)) => {
                    for (rule_index, rule_id) in rule_ids.iter().enumerate() {
                        disabled_rules.insert(
                            rule_id,
                            DirectiveEntry {
                                directive_index,
                                rule_index: Some(rule_index),
                            },
                        );
                    }
                }
                (DisableDirectiveKind::Enable, None) => {
                    all_disabled = None;
                    disabled_rules.clear();
                }
                (DisableDirectiveKind::Enable, Some(rule_ids)) => {
                    for rule_id in rule_ids {
                        disabled_rules.remove(&**rule_id);
                    }
                }
                _ => {}
            }
            next_block += 1;
        }

        let covering = find_covering_entry(
            problem,
            all_disabled,
            &disabled_rules,
            &line_directives,
        );
        if let Some(entry) = covering {
            used.insert(entry);
            let directive = &directives[entry.directive_index];
            problem.suppressions.push(Suppression {
                kind: "directive".to_owned(),
                justification: directive.justification.clone().unwrap_or_default(),
            });
            problem.fatal = false;
        }
    }

    if report_unused != Severity::Off {
        let mut unused = Vec::new();
        for (directive_index, directive) in directives.iter().enumerate() {
            if directive.kind == DisableDirectiveKind::Enable {
                continue;
            }
            let entry_count = directive.rule_ids.as_ref().map_or(1, Vec::len);
            let unused_entries: Vec<Option<usize>> = (0..entry_count)
                .map(|rule_index| directive.rule_ids.is_some().then_some(rule_index))
                .filter(|&rule_index| {
                    !used.contains(&DirectiveEntry {
                        directive_index,
                        rule_index,
                    })
                })
                .filter(|rule_index| match rule_index {
                    Some(rule_index) => {
                        enabled_rules.contains(&directive.rule_ids.as_ref().unwrap()[*rule_index])
                    }
                    None => true,
                })
                .collect();
            if unused_entries.is_empty() {
                continue;
            }
            let fully_unused = unused_entries.len() == entry_count;
            let description = match &directive.rule_ids {
                None => "(no problems were reported)".to_owned(),
                Some(rule_ids) => {
                    let names = unused_entries
                        .iter()
                        .map(|rule_index| format!("'{}'", rule_ids[rule_index.unwrap()]))
                        .join(" or ");
                    format!("(no problems were reported from {names})")
                }
            };
            let fix = (!disable_fixes && fully_unused).then(|| Fix {
                range: directive.comment_range,
                text: String::new(),
            });
            unused.push(LintMessage {
                rule_id: None,
                severity: report_unused,
                message: format!("Unused eslint-disable directive {description}."),
                message_id: None,
                line: directive.comment_line,
                column: directive.comment_column,
                end_line: None,
                end_column: None,
                node_type: None,
                fix,
                suggestions: Default::default(),
                fatal: false,
                suppressions: Default::default(),
            });
        }
        problems.extend(unused);
        problems.sort_by_key(LintMessage::position);
    }

    problems
}

fn find_covering_entry(
    problem: &LintMessage,
    all_disabled: Option<DirectiveEntry>,
    disabled_rules: &HashMap<&str, DirectiveEntry>,
    line_directives: &[(usize, &DisableDirective)],
) -> Option<DirectiveEntry> {
    if let Some(entry) = all_disabled {
        return Some(entry);
    }
    if let Some(rule_id) = &problem.rule_id {
        if let Some(&entry) = disabled_rules.get(&**rule_id) {
            return Some(entry);
        }
    }
    for (directive_index, directive) in line_directives {
        if directive.line != problem.line {
            continue;
        }
        match &directive.rule_ids {
            None => {
                return Some(DirectiveEntry {
                    directive_index: *directive_index,
                    rule_index: None,
                });
            }
            Some(rule_ids) => {
                if let Some(rule_id) = &problem.rule_id {
                    if let Some(rule_index) = rule_ids.iter().position(|id| id == rule_id) {
                        return Some(DirectiveEntry {
                            directive_index: *directive_index,
                            rule_index: Some(rule_index),
                        });
                    }
                }
            }
        }
    }
    None
}
