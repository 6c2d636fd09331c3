use std::cell::RefCell;

use serde_json::Value;

use crate::ast::{
    Ast, Comment, NodeData, NodeId, Position, SourceLocation, SourceRange, Token, VisitorKeys,
};
use crate::config::LanguageOptions;
use crate::scope::{ScopeId, ScopeManager};
use crate::token_store::TokenStore;

const BOM: char = '\u{feff}';

/// A parse failure, positioned when the parser can say where.
#[derive(Clone, Debug)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// What a parser hands back: the ESTree arena plus the token and
/// comment streams (each sorted by range start, non-overlapping).
#[derive(Debug)]
pub struct ParseResult {
    pub ast: Ast,
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub visitor_keys: Option<VisitorKeys>,
    pub scope_manager: Option<ScopeManager>,
    pub services: serde_json::Map<String, Value>,
}

/// The parser collaborator. Implementations live outside this crate.
pub trait Parser {
    fn parse(&self, text: &str, options: &LanguageOptions) -> Result<ParseResult, ParseError>;
}

/// Line-start table over the BOM-stripped text. Recognizes CR, LF,
/// CRLF, U+2028 and U+2029 as terminators.
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut chars = text.char_indices().peekable();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '\r' => {
                    if matches!(chars.peek(), Some((_, '\n'))) {
                        chars.next();
                        line_starts.push(offset + 2);
                    } else {
                        line_starts.push(offset + 1);
                    }
                }
                '\n' => line_starts.push(offset + 1),
                '\u{2028}' | '\u{2029}' => line_starts.push(offset + ch.len_utf8()),
                _ => {}
            }
        }
        Self {
            line_starts,
            text_len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line.checked_sub(1)?).copied()
    }

    pub fn position_from_offset(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        Position::new(line, offset - self.line_starts[line - 1])
    }

    pub fn offset_from_position(&self, position: Position) -> Option<usize> {
        let start = self.line_start(position.line)?;
        let end = self
            .line_starts
            .get(position.line)
            .copied()
            .unwrap_or(self.text_len);
        let offset = start + position.column;
        (offset <= end).then_some(offset)
    }
}

/// Everything known about one file for exactly one lint pass: text,
/// AST, token store, scope, line index and the lazily-populated
/// parent table. Dropped wholesale when the pass ends.
pub struct SourceCode {
    text: String,
    has_bom: bool,
    ast: Ast,
    visitor_keys: VisitorKeys,
    scope_manager: ScopeManager,
    parser_services: serde_json::Map<String, Value>,
    line_index: LineIndex,
    token_store: TokenStore,
    parents: RefCell<Vec<Option<NodeId>>>,
}

impl SourceCode {
    pub fn new(text: impl Into<String>, parse_result: ParseResult) -> Self {
        let mut text = text.into();
        let has_bom = text.starts_with(BOM);
        if has_bom {
            text.drain(..BOM.len_utf8());
        }
        let ParseResult {
            ast,
            tokens,
            comments,
            visitor_keys,
            scope_manager,
            services,
        } = parse_result;
        let line_index = LineIndex::new(&text);
        let parents = RefCell::new(vec![None; ast.len()]);
        let scope_manager = scope_manager.unwrap_or_else(|| ScopeManager::trivial(ast.root()));
        Self {
            text,
            has_bom,
            visitor_keys: visitor_keys.unwrap_or_else(VisitorKeys::standard),
            scope_manager,
            parser_services: services,
            line_index,
            token_store: TokenStore::new(tokens, comments),
            parents,
            ast,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        self.ast.node(id)
    }

    pub fn visitor_keys(&self) -> &VisitorKeys {
        &self.visitor_keys
    }

    pub fn scope_manager(&self) -> &ScopeManager {
        &self.scope_manager
    }

    pub fn parser_services(&self) -> &serde_json::Map<String, Value> {
        &self.parser_services
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.token_store
    }

    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    pub fn position_from_offset(&self, offset: usize) -> Position {
        self.line_index.position_from_offset(offset)
    }

    pub fn offset_from_position(&self, position: Position) -> Option<usize> {
        self.line_index.offset_from_position(position)
    }

    pub fn get_text(&self, node: NodeId) -> &str {
        self.get_text_range(self.node(node).range())
    }

    pub fn get_text_range(&self, range: SourceRange) -> &str {
        &self.text[range.start..range.end]
    }

    /// Text of one 1-based line, without its terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = self.line_index.line_start(line)?;
        let end = self
            .line_index
            .line_start(line + 1)
            .unwrap_or(self.text.len());
        let slice = &self.text[start..end];
        Some(slice.trim_end_matches(['\r', '\n', '\u{2028}', '\u{2029}']))
    }

    pub fn loc_for_range(&self, range: SourceRange) -> SourceLocation {
        SourceLocation::new(
            self.position_from_offset(range.start),
            self.position_from_offset(range.end),
        )
    }

    pub(crate) fn set_parent(&self, child: NodeId, parent: NodeId) {
        self.parents.borrow_mut()[child.index()] = Some(parent);
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parents.borrow()[node.index()]
    }

    /// Ancestors from the root down to (excluding) `node`. Only valid
    /// once the traverser has visited `node`.
    pub fn ancestors_of(&self, node: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(node);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.parent_of(id);
        }
        ancestors.reverse();
        ancestors
    }

    pub fn innermost_scope_for(&self, node: NodeId) -> ScopeId {
        self.scope_manager
            .innermost_scope_for(node, |id| self.parent_of(id))
    }
}
