use crate::ast::{Comment, Token};

use super::{MergedEntry, TokenFilter, TokenOrComment};

/// An iterator with an explicit current-item slot. Decorators compose
/// over any cursor in the fixed order base → filter → skip → limit.
pub trait Cursor<'a> {
    fn move_next(&mut self) -> bool;
    fn current(&self) -> Option<TokenOrComment<'a>>;
}

pub(super) struct ForwardTokenCursor<'a> {
    tokens: &'a [Token],
    next: usize,
    end: usize,
    current: Option<TokenOrComment<'a>>,
}

impl<'a> ForwardTokenCursor<'a> {
    pub fn new(tokens: &'a [Token], start: usize, end: usize) -> Self {
        Self {
            tokens,
            next: start,
            end,
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for ForwardTokenCursor<'a> {
    fn move_next(&mut self) -> bool {
        if self.next < self.end {
            self.current = Some(TokenOrComment::Token(&self.tokens[self.next]));
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.current
    }
}

pub(super) struct BackwardTokenCursor<'a> {
    tokens: &'a [Token],
    start: usize,
    next: usize,
    current: Option<TokenOrComment<'a>>,
}

impl<'a> BackwardTokenCursor<'a> {
    /// Yields `tokens[start..end]` in reverse.
    pub fn new(tokens: &'a [Token], start: usize, end: usize) -> Self {
        Self {
            tokens,
            start,
            next: end,
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for BackwardTokenCursor<'a> {
    fn move_next(&mut self) -> bool {
        if self.next > self.start {
            self.next -= 1;
            self.current = Some(TokenOrComment::Token(&self.tokens[self.next]));
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.current
    }
}

fn resolve<'a>(
    entry: &MergedEntry,
    tokens: &'a [Token],
    comments: &'a [Comment],
) -> TokenOrComment<'a> {
    if entry.comment {
        TokenOrComment::Comment(&comments[entry.index])
    } else {
        TokenOrComment::Token(&tokens[entry.index])
    }
}

pub(super) struct ForwardTokenAndCommentCursor<'a> {
    merged: &'a [MergedEntry],
    tokens: &'a [Token],
    comments: &'a [Comment],
    next: usize,
    end: usize,
    current: Option<TokenOrComment<'a>>,
}

impl<'a> ForwardTokenAndCommentCursor<'a> {
    pub fn new(
        merged: &'a [MergedEntry],
        tokens: &'a [Token],
        comments: &'a [Comment],
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            merged,
            tokens,
            comments,
            next: start,
            end,
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for ForwardTokenAndCommentCursor<'a> {
    fn move_next(&mut self) -> bool {
        if self.next < self.end {
            self.current = Some(resolve(&self.merged[self.next], self.tokens, self.comments));
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.current
    }
}

pub(super) struct BackwardTokenAndCommentCursor<'a> {
    merged: &'a [MergedEntry],
    tokens: &'a [Token],
    comments: &'a [Comment],
    start: usize,
    next: usize,
    current: Option<TokenOrComment<'a>>,
}

impl<'a> BackwardTokenAndCommentCursor<'a> {
    pub fn new(
        merged: &'a [MergedEntry],
        tokens: &'a [Token],
        comments: &'a [Comment],
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            merged,
            tokens,
            comments,
            start,
            next: end,
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for BackwardTokenAndCommentCursor<'a> {
    fn move_next(&mut self) -> bool {
        if self.next > self.start {
            self.next -= 1;
            self.current = Some(resolve(&self.merged[self.next], self.tokens, self.comments));
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.current
    }
}

pub(super) enum BaseCursor<'a> {
    ForwardTokens(ForwardTokenCursor<'a>),
    BackwardTokens(BackwardTokenCursor<'a>),
    ForwardAll(ForwardTokenAndCommentCursor<'a>),
    BackwardAll(BackwardTokenAndCommentCursor<'a>),
}

impl<'a> Cursor<'a> for BaseCursor<'a> {
    fn move_next(&mut self) -> bool {
        match self {
            Self::ForwardTokens(cursor) => cursor.move_next(),
            Self::BackwardTokens(cursor) => cursor.move_next(),
            Self::ForwardAll(cursor) => cursor.move_next(),
            Self::BackwardAll(cursor) => cursor.move_next(),
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        match self {
            Self::ForwardTokens(cursor) => cursor.current(),
            Self::BackwardTokens(cursor) => cursor.current(),
            Self::ForwardAll(cursor) => cursor.current(),
            Self::BackwardAll(cursor) => cursor.current(),
        }
    }
}

/// Drops items failing the predicate. A `None` predicate passes
/// everything through.
pub(super) struct FilterCursor<C> {
    inner: C,
    predicate: Option<TokenFilter>,
}

impl<C> FilterCursor<C> {
    pub fn new(inner: C, predicate: Option<TokenFilter>) -> Self {
        Self { inner, predicate }
    }
}

impl<'a, C: Cursor<'a>> Cursor<'a> for FilterCursor<C> {
    fn move_next(&mut self) -> bool {
        loop {
            if !self.inner.move_next() {
                return false;
            }
            let item = self.inner.current().unwrap();
            match self.predicate.as_ref() {
                Some(predicate) if !(**predicate)(item) => continue,
                _ => return true,
            }
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.inner.current()
    }
}

/// Discards the first n yielded items.
pub(super) struct SkipCursor<C> {
    inner: C,
    remaining: usize,
}

impl<C> SkipCursor<C> {
    pub fn new(inner: C, count: usize) -> Self {
        Self {
            inner,
            remaining: count,
        }
    }
}

impl<'a, C: Cursor<'a>> Cursor<'a> for SkipCursor<C> {
    fn move_next(&mut self) -> bool {
        while self.remaining > 0 {
            self.remaining -= 1;
            if !self.inner.move_next() {
                return false;
            }
        }
        self.inner.move_next()
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.inner.current()
    }
}

/// Yields at most n items. `None` means unlimited.
pub(super) struct LimitCursor<C> {
    inner: C,
    remaining: Option<usize>,
}

impl<C> LimitCursor<C> {
    pub fn new(inner: C, count: Option<usize>) -> Self {
        Self {
            inner,
            remaining: count,
        }
    }
}

impl<'a, C: Cursor<'a>> Cursor<'a> for LimitCursor<C> {
    fn move_next(&mut self) -> bool {
        match self.remaining {
            Some(0) => false,
            Some(count) => {
                self.remaining = Some(count - 1);
                self.inner.move_next()
            }
            None => self.inner.move_next(),
        }
    }

    fn current(&self) -> Option<TokenOrComment<'a>> {
        self.inner.current()
    }
}

pub(super) type DecoratedCursor<'a> = LimitCursor<SkipCursor<FilterCursor<BaseCursor<'a>>>>;

pub(super) fn decorate(
    base: BaseCursor<'_>,
    filter: Option<TokenFilter>,
    skip: usize,
    limit: Option<usize>,
) -> DecoratedCursor<'_> {
    LimitCursor::new(SkipCursor::new(FilterCursor::new(base, filter), skip), limit)
}
