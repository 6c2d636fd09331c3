use super::code_path::SegmentId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum ChoiceKind {
    If,
    Conditional,
    Logical,
}

#[derive(Debug)]
pub(super) struct ChoiceContext {
    pub kind: ChoiceKind,
    /// Segments at the end of the test (or left operand).
    pub test_end: Vec<SegmentId>,
    /// Collected branch ends awaiting the join.
    pub branch_ends: Vec<SegmentId>,
    pub entered_alternate: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum LoopKind {
    While,
    DoWhile,
    For,
    ForIn,
    ForOf,
}

#[derive(Debug)]
pub(super) struct LoopContext {
    pub kind: LoopKind,
    pub label: Option<String>,
    /// Back-edge target: the test segment (while/for) or the body
    /// segment (do-while/for-in/for-of).
    pub entry: Option<SegmentId>,
    /// Segments where the loop condition was seen false.
    pub test_end: Vec<SegmentId>,
    /// `break` departure points.
    pub broken: Vec<SegmentId>,
    /// `continue` departure points, connected to the entry when the
    /// loop closes (do-while connects them to the test instead).
    pub continued: Vec<SegmentId>,
    /// `for` only: the pre-created update segment.
    pub update_start: Option<SegmentId>,
    pub update_end: Vec<SegmentId>,
    /// `for` only: head when the update clause was entered.
    pub pre_update: Vec<SegmentId>,
}

#[derive(Debug)]
pub(super) struct SwitchContext {
    pub label: Option<String>,
    /// Segments at the end of the discriminant.
    pub source: Vec<SegmentId>,
    pub saw_case: bool,
    pub has_default: bool,
    pub broken: Vec<SegmentId>,
}

#[derive(Debug)]
pub(super) struct TryContext {
    /// Head when the try statement was entered.
    pub try_entry: Vec<SegmentId>,
    /// Explicit `throw` departure points inside the block.
    pub thrown: Vec<SegmentId>,
    pub block_end: Vec<SegmentId>,
    pub catch_end: Vec<SegmentId>,
    pub entered_handler: bool,
    pub entered_finalizer: bool,
}

#[derive(Debug)]
pub(super) enum Context {
    Choice(ChoiceContext),
    Loop(LoopContext),
    Switch(SwitchContext),
    Try(TryContext),
}

/// Mutable traversal state of one code path: the current head plus a
/// stack of open branch constructs.
#[derive(Debug)]
pub(super) struct CodePathState {
    pub current: Vec<SegmentId>,
    /// Segments whose start events have been emitted and not ended.
    pub emitted: Vec<SegmentId>,
    pub context_stack: Vec<Context>,
}

impl CodePathState {
    pub fn new(initial: SegmentId) -> Self {
        Self {
            current: vec![initial],
            emitted: Default::default(),
            context_stack: Default::default(),
        }
    }

    pub fn push_choice(&mut self, kind: ChoiceKind) {
        self.context_stack.push(Context::Choice(ChoiceContext {
            kind,
            test_end: Default::default(),
            branch_ends: Default::default(),
            entered_alternate: false,
        }));
    }

    pub fn push_loop(&mut self, kind: LoopKind, label: Option<String>) {
        self.context_stack.push(Context::Loop(LoopContext {
            kind,
            label,
            entry: None,
            test_end: Default::default(),
            broken: Default::default(),
            continued: Default::default(),
            update_start: None,
            update_end: Default::default(),
            pre_update: Default::default(),
        }));
    }

    pub fn push_switch(&mut self, label: Option<String>) {
        self.context_stack.push(Context::Switch(SwitchContext {
            label,
            source: Default::default(),
            saw_case: false,
            has_default: false,
            broken: Default::default(),
        }));
    }

    pub fn push_try(&mut self) {
        self.context_stack.push(Context::Try(TryContext {
            try_entry: self.current.clone(),
            thrown: Default::default(),
            block_end: Default::default(),
            catch_end: Default::default(),
            entered_handler: false,
            entered_finalizer: false,
        }));
    }

    pub fn pop(&mut self) -> Option<Context> {
        self.context_stack.pop()
    }

    pub fn top_choice(&mut self) -> Option<&mut ChoiceContext> {
        match self.context_stack.last_mut() {
            Some(Context::Choice(context)) => Some(context),
            _ => None,
        }
    }

    pub fn top_loop(&mut self) -> Option<&mut LoopContext> {
        match self.context_stack.last_mut() {
            Some(Context::Loop(context)) => Some(context),
            _ => None,
        }
    }

    pub fn top_switch(&mut self) -> Option<&mut SwitchContext> {
        match self.context_stack.last_mut() {
            Some(Context::Switch(context)) => Some(context),
            _ => None,
        }
    }

    /// Innermost context a `break` escapes: a loop or a switch, by
    /// label when one is given.
    pub fn break_target(&mut self, label: Option<&str>) -> Option<&mut Context> {
        self.context_stack.iter_mut().rev().find(|context| {
            let (is_breakable, context_label) = match context {
                Context::Loop(ctx) => (true, ctx.label.as_deref()),
                Context::Switch(ctx) => (true, ctx.label.as_deref()),
                _ => (false, None),
            };
            is_breakable && label.map_or(true, |label| context_label == Some(label))
        })
    }

    /// Innermost loop a `continue` targets.
    pub fn continue_target(&mut self, label: Option<&str>) -> Option<&mut LoopContext> {
        self.context_stack
            .iter_mut()
            .rev()
            .find_map(|context| match context {
                Context::Loop(ctx)
                    if label.map_or(true, |label| ctx.label.as_deref() == Some(label)) =>
                {
                    Some(ctx)
                }
                _ => None,
            })
    }

    /// Innermost try block that an explicit `throw` lands in.
    pub fn nearest_try(&mut self) -> Option<&mut TryContext> {
        self.context_stack
            .iter_mut()
            .rev()
            .find_map(|context| match context {
                Context::Try(ctx) if !ctx.entered_handler && !ctx.entered_finalizer => Some(ctx),
                _ => None,
            })
    }
}
