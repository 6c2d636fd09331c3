use crate::ast::{NodeId, SourceRange};
use crate::source_code::SourceCode;
use crate::violation::Fix;

/// The edit vocabulary handed to a rule's lazy fix callback. Edits
/// accumulate; the arbitrator decides later which reports' edits
/// actually land.
pub struct RuleFixer<'a> {
    source_code: &'a SourceCode,
    fixes: Vec<Fix>,
}

impl<'a> RuleFixer<'a> {
    pub(crate) fn new(source_code: &'a SourceCode) -> Self {
        Self {
            source_code,
            fixes: Default::default(),
        }
    }

    fn range_of(&self, node: NodeId) -> SourceRange {
        self.source_code.node(node).range()
    }

    pub fn replace_text(&mut self, node: NodeId, replacement: impl Into<String>) {
        self.replace_text_range(self.range_of(node), replacement);
    }

    pub fn replace_text_range(&mut self, range: SourceRange, replacement: impl Into<String>) {
        self.fixes.push(Fix {
            range,
            text: replacement.into(),
        });
    }

    pub fn remove(&mut self, node: NodeId) {
        self.remove_range(self.range_of(node));
    }

    pub fn remove_range(&mut self, range: SourceRange) {
        self.replace_text_range(range, "");
    }

    pub fn insert_text_before(&mut self, node: NodeId, text: impl Into<String>) {
        self.insert_text_before_range(self.range_of(node), text);
    }

    pub fn insert_text_before_range(&mut self, range: SourceRange, text: impl Into<String>) {
        self.replace_text_range(range.collapsed_start(), text);
    }

    pub fn insert_text_after(&mut self, node: NodeId, text: impl Into<String>) {
        self.insert_text_after_range(self.range_of(node), text);
    }

    pub fn insert_text_after_range(&mut self, range: SourceRange, text: impl Into<String>) {
        self.replace_text_range(range.collapsed_end(), text);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub(crate) fn into_fixes(self) -> Vec<Fix> {
        self.fixes
    }
}
