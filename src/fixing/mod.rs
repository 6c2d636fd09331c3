use std::cmp::Ordering;

use tracing::debug;

use crate::violation::{Fix, LintMessage};

mod fixer;

pub use fixer::RuleFixer;

pub(crate) const MAX_FIX_PASSES: usize = 10;

/// Result of one arbitration pass: `messages` keeps the problems whose
/// fixes were not applied (plus everything unfixable).
#[derive(Debug)]
pub struct FixResult {
    pub fixed: bool,
    pub output: String,
    pub messages: Vec<LintMessage>,
}

fn compare_fixes(a: &Fix, b: &Fix) -> Ordering {
    a.range
        .start
        .cmp(&b.range.start)
        .then(a.range.end.cmp(&b.range.end))
}

/// Collapses the fixes one report produced into a single span. The
/// gap text between them is preserved verbatim. Overlapping fixes
/// within one report are a rule bug and are rejected.
pub(crate) fn merge_fixes(mut fixes: Vec<Fix>, text: &str) -> Result<Option<Fix>, ()> {
    match fixes.len() {
        0 => return Ok(None),
        1 => return Ok(fixes.pop()),
        _ => {}
    }
    fixes.sort_by(compare_fixes);
    let start = fixes.first().unwrap().range.start;
    let end = fixes.last().unwrap().range.end;
    let mut merged = String::new();
    let mut cursor = start;
    for fix in &fixes {
        if fix.range.start < cursor {
            return Err(());
        }
        merged.push_str(&text[cursor..fix.range.start]);
        merged.push_str(&fix.text);
        cursor = fix.range.end;
    }
    merged.push_str(&text[cursor..end]);
    Ok(Some(Fix {
        range: crate::ast::SourceRange::new(start, end),
        text: merged,
    }))
}

/// Applies a maximal non-conflicting subset of the messages' fixes.
/// Fixes are taken in `(start, end)` order; one whose start lies
/// before the previous accepted end is skipped and its message
/// survives. Touching endpoints do not conflict.
pub(crate) fn apply_fixes(
    text: &str,
    messages: Vec<LintMessage>,
    should_fix: &dyn Fn(&LintMessage) -> bool,
) -> FixResult {
    let mut fixable: Vec<LintMessage> = Vec::new();
    let mut remaining: Vec<LintMessage> = Vec::new();
    for message in messages {
        let valid_fix = message
            .fix
            .as_ref()
            .is_some_and(|fix| fix.range.start <= fix.range.end && fix.range.end <= text.len());
        if valid_fix && should_fix(&message) {
            fixable.push(message);
        } else {
            remaining.push(message);
        }
    }
    fixable.sort_by(|a, b| compare_fixes(a.fix.as_ref().unwrap(), b.fix.as_ref().unwrap()));

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut applied = 0usize;
    for message in fixable {
        let fix = message.fix.as_ref().unwrap();
        if fix.range.start < cursor {
            // Conflicts with the previously accepted fix.
            remaining.push(message);
            continue;
        }
        output.push_str(&text[cursor..fix.range.start]);
        output.push_str(&fix.text);
        cursor = fix.range.end;
        applied += 1;
    }
    output.push_str(&text[cursor..]);

    let fixed = applied > 0;
    if !fixed {
        debug_assert_eq!(output, text);
    }
    debug!(applied, remaining = remaining.len(), "applied fixes");

    remaining.sort_by_key(|message| message.position());
    FixResult {
        fixed,
        output,
        messages: remaining,
    }
}
