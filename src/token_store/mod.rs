use std::collections::HashMap;

use derive_builder::Builder;

use crate::ast::{Comment, SourceLocation, SourceRange, Token};

mod cursors;

use cursors::{
    decorate, BackwardTokenAndCommentCursor, BackwardTokenCursor, BaseCursor,
    ForwardTokenAndCommentCursor, ForwardTokenCursor,
};
pub use cursors::Cursor;

/// A token or a comment, as yielded by positional queries.
#[derive(Copy, Clone, Debug)]
pub enum TokenOrComment<'a> {
    Token(&'a Token),
    Comment(&'a Comment),
}

impl<'a> TokenOrComment<'a> {
    pub fn value(&self) -> &'a str {
        match self {
            Self::Token(token) => &token.value,
            Self::Comment(comment) => &comment.value,
        }
    }

    pub fn range(&self) -> SourceRange {
        match self {
            Self::Token(token) => token.range,
            Self::Comment(comment) => comment.range,
        }
    }

    pub fn loc(&self) -> SourceLocation {
        match self {
            Self::Token(token) => token.loc,
            Self::Comment(comment) => comment.loc,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    pub fn as_token(&self) -> Option<&'a Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&'a Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
            _ => None,
        }
    }
}

pub type TokenFilter = std::rc::Rc<dyn Fn(TokenOrComment<'_>) -> bool>;

/// Options for single-token queries.
#[derive(Builder, Default)]
#[builder(default, setter(strip_option))]
pub struct SkipOptions {
    skip: Option<usize>,
    include_comments: Option<bool>,
    #[builder(setter(custom))]
    filter: Option<TokenFilter>,
}

impl SkipOptions {
    pub fn skip(&self) -> usize {
        self.skip.unwrap_or_default()
    }

    pub fn include_comments(&self) -> bool {
        self.include_comments.unwrap_or_default()
    }

    pub fn into_filter(self) -> Option<TokenFilter> {
        self.filter
    }
}

impl SkipOptionsBuilder {
    pub fn filter(&mut self, filter: impl Fn(TokenOrComment<'_>) -> bool + 'static) -> &mut Self {
        self.filter = Some(Some(std::rc::Rc::new(filter)));
        self
    }
}

impl From<usize> for SkipOptions {
    fn from(value: usize) -> Self {
        Self {
            skip: Some(value),
            include_comments: Default::default(),
            filter: Default::default(),
        }
    }
}

/// Options for multi-token queries. An absent count means "all
/// matching".
#[derive(Builder, Default)]
#[builder(default, setter(strip_option))]
pub struct CountOptions {
    count: Option<usize>,
    include_comments: Option<bool>,
    #[builder(setter(custom))]
    filter: Option<TokenFilter>,
}

impl CountOptions {
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn include_comments(&self) -> bool {
        self.include_comments.unwrap_or_default()
    }

    pub fn into_filter(self) -> Option<TokenFilter> {
        self.filter
    }
}

impl CountOptionsBuilder {
    pub fn filter(&mut self, filter: impl Fn(TokenOrComment<'_>) -> bool + 'static) -> &mut Self {
        self.filter = Some(Some(std::rc::Rc::new(filter)));
        self
    }
}

impl From<usize> for CountOptions {
    fn from(value: usize) -> Self {
        Self {
            count: Some(value),
            include_comments: Default::default(),
            filter: Default::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct MergedEntry {
    start: usize,
    end: usize,
    comment: bool,
    index: usize,
}

/// Positional queries over tokens and comments. Queries never mutate
/// the underlying arrays; all state lives in the cursors they return.
pub struct TokenStore {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    merged: Vec<MergedEntry>,
    start_map: HashMap<usize, usize>,
    end_map: HashMap<usize, usize>,
}

impl TokenStore {
    pub fn new(tokens: Vec<Token>, comments: Vec<Comment>) -> Self {
        let mut merged = Vec::with_capacity(tokens.len() + comments.len());
        let mut token_iter = tokens.iter().enumerate().peekable();
        let mut comment_iter = comments.iter().enumerate().peekable();
        loop {
            match (token_iter.peek(), comment_iter.peek()) {
                (Some((_, token)), Some((_, comment)))
                    if comment.range.start < token.range.start =>
                {
                    let (index, comment) = comment_iter.next().unwrap();
                    merged.push(MergedEntry {
                        start: comment.range.start,
                        end: comment.range.end,
                        comment: true,
                        index,
                    });
                }
                (Some(_), _) => {
                    let (index, token) = token_iter.next().unwrap();
                    merged.push(MergedEntry {
                        start: token.range.start,
                        end: token.range.end,
                        comment: false,
                        index,
                    });
                }
                (None, Some(_)) => {
                    let (index, comment) = comment_iter.next().unwrap();
                    merged.push(MergedEntry {
                        start: comment.range.start,
                        end: comment.range.end,
                        comment: true,
                        index,
                    });
                }
                (None, None) => break,
            }
        }

        let mut start_map = HashMap::with_capacity(merged.len());
        let mut end_map = HashMap::with_capacity(merged.len());
        for (index, token) in tokens.iter().enumerate() {
            start_map.insert(token.range.start, index);
            end_map.insert(token.range.end, index + 1);
        }
        // Comment locations point at the following token, so boundary
        // lookups starting at a comment land on the right token.
        for comment in &comments {
            let following = tokens.partition_point(|token| token.range.start < comment.range.start);
            start_map.entry(comment.range.start).or_insert(following);
            end_map.entry(comment.range.end).or_insert(following);
        }

        Self {
            tokens,
            comments,
            merged,
            start_map,
            end_map,
        }
    }

    pub fn all_tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn all_comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Least token index whose range starts at or after `offset`,
    /// via the O(1) map when it hits.
    fn first_token_index(&self, offset: usize) -> usize {
        if let Some(&index) = self.start_map.get(&offset) {
            if index >= self.tokens.len() || self.tokens[index].range.start >= offset {
                return index.min(self.tokens.len());
            }
        }
        self.tokens
            .partition_point(|token| token.range.start < offset)
    }

    /// Count of tokens whose range ends at or before `offset`.
    fn last_token_index(&self, offset: usize) -> usize {
        if let Some(&index) = self.end_map.get(&offset) {
            if index <= self.tokens.len()
                && (index == 0 || self.tokens[index - 1].range.end <= offset)
            {
                return index;
            }
        }
        self.tokens.partition_point(|token| token.range.end <= offset)
    }

    fn first_merged_index(&self, offset: usize) -> usize {
        self.merged.partition_point(|entry| entry.start < offset)
    }

    fn last_merged_index(&self, offset: usize) -> usize {
        self.merged.partition_point(|entry| entry.end <= offset)
    }

    fn forward(&self, start: usize, end: usize, include_comments: bool) -> BaseCursor<'_> {
        if include_comments {
            BaseCursor::ForwardAll(ForwardTokenAndCommentCursor::new(
                &self.merged,
                &self.tokens,
                &self.comments,
                start,
                end,
            ))
        } else {
            BaseCursor::ForwardTokens(ForwardTokenCursor::new(&self.tokens, start, end))
        }
    }

    fn backward(&self, start: usize, end: usize, include_comments: bool) -> BaseCursor<'_> {
        if include_comments {
            BaseCursor::BackwardAll(BackwardTokenAndCommentCursor::new(
                &self.merged,
                &self.tokens,
                &self.comments,
                start,
                end,
            ))
        } else {
            BaseCursor::BackwardTokens(BackwardTokenCursor::new(&self.tokens, start, end))
        }
    }

    /// Index bounds of the items inside `[span.start, span.end)`, in
    /// whichever domain `include_comments` selects.
    fn inside_bounds(&self, span: SourceRange, include_comments: bool) -> (usize, usize) {
        if include_comments {
            (
                self.first_merged_index(span.start),
                self.last_merged_index(span.end),
            )
        } else {
            (
                self.first_token_index(span.start),
                self.last_token_index(span.end),
            )
        }
    }

    fn single<'a>(
        &'a self,
        base: BaseCursor<'a>,
        options: SkipOptions,
    ) -> Option<TokenOrComment<'a>> {
        let skip = options.skip();
        let mut cursor = decorate(base, options.into_filter(), skip, None);
        cursor.move_next();
        cursor.current()
    }

    fn collect<'a>(
        &'a self,
        base: BaseCursor<'a>,
        options: CountOptions,
        reverse: bool,
    ) -> Vec<TokenOrComment<'a>> {
        let count = options.count();
        let mut cursor = decorate(base, options.into_filter(), 0, count);
        let mut items = Vec::new();
        while cursor.move_next() {
            items.push(cursor.current().unwrap());
        }
        if reverse {
            items.reverse();
        }
        items
    }

    pub fn get_first_token(
        &self,
        span: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.inside_bounds(span, options.include_comments());
        self.single(self.forward(start, end, options.include_comments()), options)
    }

    pub fn get_last_token(
        &self,
        span: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.inside_bounds(span, options.include_comments());
        self.single(self.backward(start, end, options.include_comments()), options)
    }

    pub fn get_token_before(
        &self,
        span: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let end = if options.include_comments() {
            self.last_merged_index(span.start)
        } else {
            self.last_token_index(span.start)
        };
        self.single(self.backward(0, end, options.include_comments()), options)
    }

    pub fn get_token_after(
        &self,
        span: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = if options.include_comments() {
            (self.first_merged_index(span.end), self.merged.len())
        } else {
            (self.first_token_index(span.end), self.tokens.len())
        };
        self.single(self.forward(start, end, options.include_comments()), options)
    }

    /// All tokens inside the span, honoring count/filter/comments.
    pub fn get_tokens(
        &self,
        span: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        self.get_first_tokens(span, options)
    }

    pub fn get_first_tokens(
        &self,
        span: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.inside_bounds(span, options.include_comments());
        self.collect(
            self.forward(start, end, options.include_comments()),
            options,
            false,
        )
    }

    pub fn get_last_tokens(
        &self,
        span: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.inside_bounds(span, options.include_comments());
        self.collect(
            self.backward(start, end, options.include_comments()),
            options,
            true,
        )
    }

    pub fn get_tokens_before(
        &self,
        span: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let end = if options.include_comments() {
            self.last_merged_index(span.start)
        } else {
            self.last_token_index(span.start)
        };
        self.collect(
            self.backward(0, end, options.include_comments()),
            options,
            true,
        )
    }

    pub fn get_tokens_after(
        &self,
        span: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = if options.include_comments() {
            (self.first_merged_index(span.end), self.merged.len())
        } else {
            (self.first_token_index(span.end), self.tokens.len())
        };
        self.collect(
            self.forward(start, end, options.include_comments()),
            options,
            false,
        )
    }

    /// Tokens strictly between two spans: range start at or past
    /// `left`'s end, range end at or before `right`'s start.
    pub fn get_tokens_between(
        &self,
        left: SourceRange,
        right: SourceRange,
        options: Option<impl Into<CountOptions>>,
    ) -> Vec<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.between_bounds(left, right, options.include_comments());
        self.collect(
            self.forward(start, end, options.include_comments()),
            options,
            false,
        )
    }

    pub fn get_first_token_between(
        &self,
        left: SourceRange,
        right: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.between_bounds(left, right, options.include_comments());
        self.single(self.forward(start, end, options.include_comments()), options)
    }

    pub fn get_last_token_between(
        &self,
        left: SourceRange,
        right: SourceRange,
        options: Option<impl Into<SkipOptions>>,
    ) -> Option<TokenOrComment<'_>> {
        let options = options.map(Into::into).unwrap_or_default();
        let (start, end) = self.between_bounds(left, right, options.include_comments());
        self.single(self.backward(start, end, options.include_comments()), options)
    }

    fn between_bounds(
        &self,
        left: SourceRange,
        right: SourceRange,
        include_comments: bool,
    ) -> (usize, usize) {
        if include_comments {
            (
                self.first_merged_index(left.end),
                self.last_merged_index(right.start),
            )
        } else {
            (
                self.first_token_index(left.end),
                self.last_token_index(right.start),
            )
        }
    }

    pub fn get_token_by_range_start(
        &self,
        offset: usize,
        include_comments: bool,
    ) -> Option<TokenOrComment<'_>> {
        if include_comments {
            let index = self.first_merged_index(offset);
            let entry = self.merged.get(index)?;
            (entry.start == offset).then(|| {
                if entry.comment {
                    TokenOrComment::Comment(&self.comments[entry.index])
                } else {
                    TokenOrComment::Token(&self.tokens[entry.index])
                }
            })
        } else {
            let index = self.first_token_index(offset);
            let token = self.tokens.get(index)?;
            (token.range.start == offset).then_some(TokenOrComment::Token(token))
        }
    }

    pub fn comments_exist_between(&self, left: SourceRange, right: SourceRange) -> bool {
        let (start, end) = self.between_bounds(left, right, true);
        self.merged[start..end].iter().any(|entry| entry.comment)
    }

    /// Comments immediately preceding the span, in source order.
    pub fn get_comments_before(&self, span: SourceRange) -> Vec<&Comment> {
        let end = self.last_merged_index(span.start);
        let mut comments: Vec<&Comment> = self.merged[..end]
            .iter()
            .rev()
            .take_while(|entry| entry.comment)
            .map(|entry| &self.comments[entry.index])
            .collect();
        comments.reverse();
        comments
    }

    /// Comments immediately following the span.
    pub fn get_comments_after(&self, span: SourceRange) -> Vec<&Comment> {
        let start = self.first_merged_index(span.end);
        self.merged[start..]
            .iter()
            .take_while(|entry| entry.comment)
            .map(|entry| &self.comments[entry.index])
            .collect()
    }
}
