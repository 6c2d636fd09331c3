use tracing::trace;

use crate::ast::{is_function_kind, Ast, NodeChild, NodeId};

mod code_path;
mod code_path_state;

pub use code_path::{CodePath, CodePathSegment, SegmentId};
use code_path_state::{ChoiceKind, CodePathState, Context, LoopKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PathId(pub(crate) usize);

/// Synthetic control-flow events, referenced by id so listeners can
/// borrow the graph at dispatch time.
#[derive(Copy, Clone, Debug)]
pub enum CodePathEvent {
    PathStart {
        path: PathId,
        node: NodeId,
    },
    PathEnd {
        path: PathId,
        node: NodeId,
    },
    SegmentStart {
        path: PathId,
        segment: SegmentId,
        node: NodeId,
    },
    SegmentEnd {
        path: PathId,
        segment: SegmentId,
        node: NodeId,
    },
    SegmentLoop {
        path: PathId,
        from: SegmentId,
        to: SegmentId,
        node: NodeId,
    },
}

/// Builds an intra-procedural control-flow model alongside the AST
/// walk. `enter_node` returns events to emit before the node's own
/// enter event; `leave_node` returns events to emit after its leave
/// event, so listeners observe the stable interleaving
/// `path-start → segment-start → enter → … → leave → segment-end →
/// path-end`.
#[derive(Default)]
pub struct CodePathAnalyzer {
    paths: Vec<CodePath>,
    states: Vec<CodePathState>,
    active: Vec<usize>,
}

impl CodePathAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self, id: PathId) -> &CodePath {
        &self.paths[id.0]
    }

    pub fn into_paths(self) -> Vec<CodePath> {
        self.paths
    }

    pub fn enter_node(
        &mut self,
        ast: &Ast,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Vec<CodePathEvent> {
        let mut events = Vec::new();
        let kind = ast.kind(node);

        // Each function-like and the program root opens its own path.
        if parent.is_none() || is_function_kind(kind) {
            if let Some(&outer) = self.active.last() {
                self.forward_to_head(outer, node, &mut events);
            }
            let path_index = self.paths.len();
            let path = CodePath::new(path_index + 1, node);
            let initial = path.initial_segment;
            trace!(path_id = %path.id, kind, "code path start");
            self.paths.push(path);
            self.states.push(CodePathState::new(initial));
            self.active.push(path_index);
            events.push(CodePathEvent::PathStart {
                path: PathId(path_index),
                node,
            });
            self.forward_to_head(path_index, node, &mut events);
            return events;
        }

        let Some(&path_index) = self.active.last() else {
            return events;
        };
        self.preprocess_enter(ast, path_index, node, parent);
        self.process_to_enter(ast, path_index, node, parent);
        self.forward_to_head(path_index, node, &mut events);
        events
    }

    pub fn leave_node(
        &mut self,
        ast: &Ast,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Vec<CodePathEvent> {
        let mut events = Vec::new();
        let kind = ast.kind(node);

        if parent.is_none() || is_function_kind(kind) {
            let path_index = self.active.pop().expect("unbalanced code path stack");
            self.forward_to_head(path_index, node, &mut events);
            let path = &mut self.paths[path_index];
            let state = &mut self.states[path_index];
            let mut final_segments = path.returned_segments.clone();
            final_segments.extend(state.current.iter().copied());
            path.final_segments = final_segments;
            for &segment in state.emitted.iter().rev() {
                events.push(CodePathEvent::SegmentEnd {
                    path: PathId(path_index),
                    segment,
                    node,
                });
            }
            state.emitted.clear();
            trace!(path_id = %path.id, kind, "code path end");
            events.push(CodePathEvent::PathEnd {
                path: PathId(path_index),
                node,
            });
            return events;
        }

        let Some(&path_index) = self.active.last() else {
            return events;
        };
        self.postprocess_leave(ast, path_index, node, &mut events);
        events
    }

    fn forward_to_head(&mut self, path_index: usize, node: NodeId, events: &mut Vec<CodePathEvent>) {
        let state = &mut self.states[path_index];
        if state.emitted == state.current {
            return;
        }
        for &segment in state.emitted.iter().rev() {
            if !state.current.contains(&segment) {
                events.push(CodePathEvent::SegmentEnd {
                    path: PathId(path_index),
                    segment,
                    node,
                });
            }
        }
        let previous = std::mem::replace(&mut state.emitted, state.current.clone());
        for &segment in &state.current {
            if !previous.contains(&segment) {
                events.push(CodePathEvent::SegmentStart {
                    path: PathId(path_index),
                    segment,
                    node,
                });
            }
        }
    }

    /// Head adjustments driven by which slot of the parent construct
    /// is being entered.
    fn preprocess_enter(&mut self, ast: &Ast, path_index: usize, node: NodeId, parent: Option<NodeId>) {
        let Some(parent) = parent else {
            return;
        };
        let parent_kind = ast.kind(parent).to_owned();
        let Some(slot) = slot_of(ast, parent, node) else {
            return;
        };
        let path = &mut self.paths[path_index];
        let state = &mut self.states[path_index];
        let current = state.current.clone();

        match (&*parent_kind, &*slot) {
            ("IfStatement" | "ConditionalExpression", "consequent") => {
                let branch = path.new_segment(current.clone());
                if let Some(context) = state.top_choice() {
                    context.test_end = current;
                }
                state.current = vec![branch];
            }
            ("IfStatement" | "ConditionalExpression", "alternate") => {
                let test_end = state
                    .top_choice()
                    .map(|context| context.test_end.clone())
                    .unwrap_or_default();
                let branch = path.new_segment(test_end);
                if let Some(context) = state.top_choice() {
                    context.branch_ends.extend(current);
                    context.entered_alternate = true;
                }
                state.current = vec![branch];
            }
            ("LogicalExpression", "right") => {
                let branch = path.new_segment(current.clone());
                if let Some(context) = state.top_choice() {
                    context.test_end = current;
                }
                state.current = vec![branch];
            }
            ("WhileStatement" | "ForStatement", "test") => {
                let test = path.new_segment(current);
                if let Some(context) = state.top_loop() {
                    context.entry = Some(test);
                }
                state.current = vec![test];
            }
            ("WhileStatement", "body") => {
                let body = path.new_segment(current.clone());
                if let Some(context) = state.top_loop() {
                    context.test_end = current;
                }
                state.current = vec![body];
            }
            ("DoWhileStatement", "body") => {
                let body = path.new_segment(current);
                if let Some(context) = state.top_loop() {
                    context.entry = Some(body);
                }
                state.current = vec![body];
            }
            ("DoWhileStatement", "test") => {
                // Continues land at the test, not the body head.
                let mut prevs = current;
                if let Some(context) = state.top_loop() {
                    prevs.extend(context.continued.drain(..));
                }
                let test = path.new_segment(prevs);
                state.current = vec![test];
            }
            ("ForStatement", "update") => {
                let reachable = current.iter().any(|&segment| path.segment(segment).reachable);
                let update = path.new_disconnected_segment(reachable);
                if let Some(context) = state.top_loop() {
                    context.pre_update = current.clone();
                    if context.entry.is_some() {
                        context.test_end = current;
                    }
                    context.update_start = Some(update);
                }
                state.current = vec![update];
            }
            ("ForStatement", "body") => {
                let (prevs, make_entry) = match state.top_loop() {
                    Some(context) if context.update_start.is_some() => {
                        context.update_end = current;
                        if context.entry.is_some() {
                            (context.test_end.clone(), false)
                        } else {
                            (context.pre_update.clone(), true)
                        }
                    }
                    Some(context) if context.entry.is_some() => {
                        context.test_end = current.clone();
                        (current, false)
                    }
                    _ => (current, true),
                };
                let body = path.new_segment(prevs);
                if let Some(context) = state.top_loop() {
                    if make_entry {
                        context.entry = Some(body);
                    }
                }
                state.current = vec![body];
            }
            ("ForInStatement" | "ForOfStatement", "body") => {
                let body = path.new_segment(current.clone());
                if let Some(context) = state.top_loop() {
                    context.test_end = current;
                    context.entry = Some(body);
                }
                state.current = vec![body];
            }
            ("SwitchStatement", "cases") => {
                let has_test = ast.node(node).child("test").is_some();
                let mut prevs = Vec::new();
                if let Some(context) = state.top_switch() {
                    if !context.saw_case {
                        context.source = current.clone();
                    } else {
                        prevs.extend(current);
                    }
                    prevs.extend(context.source.iter().copied());
                    context.saw_case = true;
                    if !has_test {
                        context.has_default = true;
                    }
                }
                let head = path.new_segment(prevs);
                state.current = vec![head];
            }
            ("TryStatement", "handler") => {
                let mut prevs = Vec::new();
                if let Some(Context::Try(context)) = state.context_stack.last_mut() {
                    context.block_end = current;
                    context.entered_handler = true;
                    prevs.extend(context.try_entry.iter().copied());
                    prevs.extend(context.thrown.iter().copied());
                    prevs.extend(context.block_end.iter().copied());
                }
                let handler = path.new_segment(prevs);
                state.current = vec![handler];
            }
            ("TryStatement", "finalizer") => {
                let mut prevs = Vec::new();
                if let Some(Context::Try(context)) = state.context_stack.last_mut() {
                    if context.entered_handler {
                        context.catch_end = current;
                    } else {
                        context.block_end = current;
                        prevs.extend(context.thrown.iter().copied());
                    }
                    context.entered_finalizer = true;
                    prevs.extend(context.block_end.iter().copied());
                    prevs.extend(context.catch_end.iter().copied());
                }
                let finalizer = path.new_segment(prevs);
                state.current = vec![finalizer];
            }
            _ => {}
        }
    }

    /// Contexts opened by the node itself.
    fn process_to_enter(&mut self, ast: &Ast, path_index: usize, node: NodeId, parent: Option<NodeId>) {
        let state = &mut self.states[path_index];
        let label = parent.and_then(|parent| label_of(ast, parent));
        match ast.kind(node) {
            "IfStatement" => state.push_choice(ChoiceKind::If),
            "ConditionalExpression" => state.push_choice(ChoiceKind::Conditional),
            "LogicalExpression" => state.push_choice(ChoiceKind::Logical),
            "WhileStatement" => state.push_loop(LoopKind::While, label),
            "DoWhileStatement" => state.push_loop(LoopKind::DoWhile, label),
            "ForStatement" => state.push_loop(LoopKind::For, label),
            "ForInStatement" => state.push_loop(LoopKind::ForIn, label),
            "ForOfStatement" => state.push_loop(LoopKind::ForOf, label),
            "SwitchStatement" => state.push_switch(label),
            "TryStatement" => state.push_try(),
            _ => {}
        }
    }

    fn postprocess_leave(
        &mut self,
        ast: &Ast,
        path_index: usize,
        node: NodeId,
        events: &mut Vec<CodePathEvent>,
    ) {
        let path = &mut self.paths[path_index];
        let state = &mut self.states[path_index];
        let current = state.current.clone();

        match ast.kind(node) {
            "IfStatement" | "ConditionalExpression" | "LogicalExpression" => {
                let Some(Context::Choice(context)) = state.pop() else {
                    return;
                };
                let mut prevs = context.branch_ends;
                prevs.extend(current);
                if context.kind == ChoiceKind::Logical || !context.entered_alternate {
                    prevs.extend(context.test_end);
                }
                let join = path.new_segment(prevs);
                state.current = vec![join];
            }
            "WhileStatement" | "ForInStatement" | "ForOfStatement" => {
                let Some(Context::Loop(context)) = state.pop() else {
                    return;
                };
                trace!(kind = ?context.kind, broken = context.broken.len(), "loop closed");
                if let Some(entry) = context.entry {
                    for &from in current.iter().chain(&context.continued) {
                        events.push(CodePathEvent::SegmentLoop {
                            path: PathId(path_index),
                            from,
                            to: entry,
                            node,
                        });
                        path.link(from, entry);
                    }
                }
                let mut prevs = context.test_end;
                prevs.extend(context.broken);
                let exit = path.new_segment(prevs);
                state.current = vec![exit];
            }
            "DoWhileStatement" => {
                let Some(Context::Loop(context)) = state.pop() else {
                    return;
                };
                if let Some(entry) = context.entry {
                    // Continues were already joined into the test.
                    for &from in &current {
                        events.push(CodePathEvent::SegmentLoop {
                            path: PathId(path_index),
                            from,
                            to: entry,
                            node,
                        });
                        path.link(from, entry);
                    }
                }
                let mut prevs = current;
                prevs.extend(context.broken);
                let exit = path.new_segment(prevs);
                state.current = vec![exit];
            }
            "ForStatement" => {
                let Some(Context::Loop(context)) = state.pop() else {
                    return;
                };
                match context.update_start {
                    Some(update) => {
                        for &from in current.iter().chain(&context.continued) {
                            path.link(from, update);
                        }
                        if let Some(entry) = context.entry {
                            for &from in &context.update_end {
                                events.push(CodePathEvent::SegmentLoop {
                                    path: PathId(path_index),
                                    from,
                                    to: entry,
                                    node,
                                });
                                path.link(from, entry);
                            }
                        } else {
                            // No test: the update feeds straight back
                            // into the body head recorded as entry.
                        }
                    }
                    None => {
                        if let Some(entry) = context.entry {
                            for &from in current.iter().chain(&context.continued) {
                                events.push(CodePathEvent::SegmentLoop {
                                    path: PathId(path_index),
                                    from,
                                    to: entry,
                                    node,
                                });
                                path.link(from, entry);
                            }
                        }
                    }
                }
                let mut prevs = context.test_end;
                prevs.extend(context.broken);
                let exit = path.new_segment(prevs);
                state.current = vec![exit];
            }
            "SwitchStatement" => {
                let Some(Context::Switch(context)) = state.pop() else {
                    return;
                };
                let mut prevs = current;
                prevs.extend(context.broken);
                if context.saw_case && !context.has_default {
                    prevs.extend(context.source);
                }
                let exit = path.new_segment(prevs);
                state.current = vec![exit];
            }
            "TryStatement" => {
                let Some(Context::Try(context)) = state.pop() else {
                    return;
                };
                let mut prevs = current;
                if !context.entered_finalizer && context.entered_handler {
                    prevs.extend(context.block_end);
                }
                let exit = path.new_segment(prevs);
                state.current = vec![exit];
            }
            "ReturnStatement" => {
                path.returned_segments.extend(current.iter().copied());
                let unreachable = path.new_unreachable_segment(current);
                state.current = vec![unreachable];
            }
            "ThrowStatement" => {
                match state.nearest_try() {
                    Some(context) => context.thrown.extend(current.iter().copied()),
                    None => path.thrown_segments.extend(current.iter().copied()),
                }
                let unreachable = path.new_unreachable_segment(current);
                state.current = vec![unreachable];
            }
            "BreakStatement" => {
                let label = jump_label(ast, node);
                if let Some(target) = state.break_target(label.as_deref()) {
                    match target {
                        Context::Loop(context) => context.broken.extend(current.iter().copied()),
                        Context::Switch(context) => context.broken.extend(current.iter().copied()),
                        _ => {}
                    }
                }
                let unreachable = path.new_unreachable_segment(current);
                state.current = vec![unreachable];
            }
            "ContinueStatement" => {
                let label = jump_label(ast, node);
                if let Some(context) = state.continue_target(label.as_deref()) {
                    context.continued.extend(current.iter().copied());
                }
                let unreachable = path.new_unreachable_segment(current);
                state.current = vec![unreachable];
            }
            _ => {}
        }
    }
}

/// Which child key of `parent` holds `node`.
fn slot_of(ast: &Ast, parent: NodeId, node: NodeId) -> Option<String> {
    for (key, child) in ast.node(parent).child_entries() {
        let found = match child {
            NodeChild::Single(id) => *id == node,
            NodeChild::Many(ids) => ids.contains(&node),
        };
        if found {
            return Some(key.to_owned());
        }
    }
    None
}

fn label_of(ast: &Ast, parent: NodeId) -> Option<String> {
    let parent_data = ast.node(parent);
    if parent_data.kind() != "LabeledStatement" {
        return None;
    }
    let label = parent_data.child("label")?;
    ast.node(label)
        .string_attribute("name")
        .map(str::to_owned)
}

fn jump_label(ast: &Ast, node: NodeId) -> Option<String> {
    let label = ast.node(node).child("label")?;
    ast.node(label)
        .string_attribute("name")
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use crate::ast::{AstBuilder, SourceLocation, SourceRange, VisitorKeys};

    use super::*;

    fn drive(
        ast: &Ast,
        keys: &VisitorKeys,
        analyzer: &mut CodePathAnalyzer,
        node: NodeId,
        parent: Option<NodeId>,
        events: &mut Vec<String>,
    ) {
        for event in analyzer.enter_node(ast, node, parent) {
            events.push(describe(analyzer, &event));
        }
        events.push(format!("enter:{}", ast.kind(node)));
        let child_keys: Vec<String> = keys
            .keys_for(ast.kind(node))
            .map(|slice| slice.to_vec())
            .unwrap_or_else(|| ast.node(node).own_child_keys().map(str::to_owned).collect());
        for key in child_keys {
            if let Some(child) = ast.node(node).child_slot(&key).cloned() {
                match child {
                    crate::ast::NodeChild::Single(id) => {
                        drive(ast, keys, analyzer, id, Some(node), events);
                    }
                    crate::ast::NodeChild::Many(ids) => {
                        for id in ids {
                            drive(ast, keys, analyzer, id, Some(node), events);
                        }
                    }
                }
            }
        }
        events.push(format!("leave:{}", ast.kind(node)));
        for event in analyzer.leave_node(ast, node, parent) {
            events.push(describe(analyzer, &event));
        }
    }

    fn describe(analyzer: &CodePathAnalyzer, event: &CodePathEvent) -> String {
        match event {
            CodePathEvent::PathStart { path, .. } => {
                format!("path-start:{}", analyzer.path(*path).id)
            }
            CodePathEvent::PathEnd { path, .. } => format!("path-end:{}", analyzer.path(*path).id),
            CodePathEvent::SegmentStart { path, segment, .. } => {
                format!("segment-start:{}", analyzer.path(*path).segment(*segment).id)
            }
            CodePathEvent::SegmentEnd { path, segment, .. } => {
                format!("segment-end:{}", analyzer.path(*path).segment(*segment).id)
            }
            CodePathEvent::SegmentLoop { path, from, to, .. } => format!(
                "segment-loop:{}->{}",
                analyzer.path(*path).segment(*from).id,
                analyzer.path(*path).segment(*to).id
            ),
        }
    }

    struct Fixture {
        builder: AstBuilder,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                builder: AstBuilder::default(),
            }
        }

        fn node(&mut self, kind: &str) -> NodeId {
            self.builder
                .add_node(kind, SourceRange::new(0, 0), SourceLocation::default())
        }
    }

    fn run(ast: &Ast) -> (CodePathAnalyzer, Vec<String>) {
        let keys = VisitorKeys::standard();
        let mut analyzer = CodePathAnalyzer::new();
        let mut events = Vec::new();
        drive(ast, &keys, &mut analyzer, ast.root(), None, &mut events);
        (analyzer, events)
    }

    #[test]
    fn test_program_event_interleaving() {
        // `x;`
        let mut fixture = Fixture::new();
        let program = fixture.node("Program");
        let statement = fixture.node("ExpressionStatement");
        let identifier = fixture.node("Identifier");
        fixture.builder.set_child(statement, "expression", identifier);
        fixture.builder.set_child_list(program, "body", [statement]);
        let ast = fixture.builder.finish(program);

        let (_, events) = run(&ast);
        assert_eq!(
            events,
            vec![
                "path-start:s1",
                "segment-start:s1_0",
                "enter:Program",
                "enter:ExpressionStatement",
                "enter:Identifier",
                "leave:Identifier",
                "leave:ExpressionStatement",
                "leave:Program",
                "segment-end:s1_0",
                "path-end:s1",
            ]
        );
    }

    #[test]
    fn test_if_without_alternate_joins_test_end() {
        // `if (a) b; c;`
        let mut fixture = Fixture::new();
        let program = fixture.node("Program");
        let if_statement = fixture.node("IfStatement");
        let test = fixture.node("Identifier");
        let consequent = fixture.node("ExpressionStatement");
        let consequent_expression = fixture.node("Identifier");
        let after = fixture.node("ExpressionStatement");
        let after_expression = fixture.node("Identifier");
        fixture
            .builder
            .set_child(consequent, "expression", consequent_expression);
        fixture.builder.set_child(after, "expression", after_expression);
        fixture.builder.set_child(if_statement, "test", test);
        fixture.builder.set_child(if_statement, "consequent", consequent);
        fixture
            .builder
            .set_child_list(program, "body", [if_statement, after]);
        let ast = fixture.builder.finish(program);

        let (analyzer, _) = run(&ast);
        let path = analyzer.path(PathId(0));
        // initial, consequent branch, join
        assert_eq!(path.segment_count(), 3);
        let join = path.segment(SegmentId(2));
        assert!(join.reachable);
        assert_eq!(join.prev_segments.len(), 2);
    }

    #[test]
    fn test_return_in_both_branches_makes_join_unreachable() {
        // `if (a) return; else return;  b;`
        let mut fixture = Fixture::new();
        let program = fixture.node("Program");
        let if_statement = fixture.node("IfStatement");
        let test = fixture.node("Identifier");
        let consequent = fixture.node("ReturnStatement");
        let alternate = fixture.node("ReturnStatement");
        let after = fixture.node("ExpressionStatement");
        let after_expression = fixture.node("Identifier");
        fixture.builder.set_child(after, "expression", after_expression);
        fixture.builder.set_child(if_statement, "test", test);
        fixture.builder.set_child(if_statement, "consequent", consequent);
        fixture.builder.set_child(if_statement, "alternate", alternate);
        fixture
            .builder
            .set_child_list(program, "body", [if_statement, after]);
        let ast = fixture.builder.finish(program);

        let (analyzer, events) = run(&ast);
        let path = analyzer.path(PathId(0));
        let join = path
            .segments()
            .last()
            .expect("join segment");
        assert!(!join.reachable);
        assert_eq!(path.returned_segments.len(), 2);
        // The unreachable tail still opens a segment before `b`.
        assert!(events
            .iter()
            .any(|event| event.starts_with("segment-start") && event.ends_with(&join.id)));
    }

    #[test]
    fn test_while_loop_emits_back_edge() {
        // `while (a) { b; } c;`
        let mut fixture = Fixture::new();
        let program = fixture.node("Program");
        let while_statement = fixture.node("WhileStatement");
        let test = fixture.node("Identifier");
        let body = fixture.node("BlockStatement");
        let statement = fixture.node("ExpressionStatement");
        let expression = fixture.node("Identifier");
        let after = fixture.node("ExpressionStatement");
        let after_expression = fixture.node("Identifier");
        fixture.builder.set_child(statement, "expression", expression);
        fixture.builder.set_child(after, "expression", after_expression);
        fixture.builder.set_child_list(body, "body", [statement]);
        fixture.builder.set_child(while_statement, "test", test);
        fixture.builder.set_child(while_statement, "body", body);
        fixture
            .builder
            .set_child_list(program, "body", [while_statement, after]);
        let ast = fixture.builder.finish(program);

        let (analyzer, events) = run(&ast);
        assert!(events.iter().any(|event| event.starts_with("segment-loop:")));
        let path = analyzer.path(PathId(0));
        let exit = path.segments().last().unwrap();
        assert!(exit.reachable);
    }

    #[test]
    fn test_function_opens_nested_path() {
        // `function f() { return; } x;`
        let mut fixture = Fixture::new();
        let program = fixture.node("Program");
        let function = fixture.node("FunctionDeclaration");
        let id = fixture.node("Identifier");
        let body = fixture.node("BlockStatement");
        let return_statement = fixture.node("ReturnStatement");
        let after = fixture.node("ExpressionStatement");
        let after_expression = fixture.node("Identifier");
        fixture.builder.set_child(after, "expression", after_expression);
        fixture.builder.set_child_list(body, "body", [return_statement]);
        fixture.builder.set_child(function, "id", id);
        fixture.builder.set_child_list(function, "params", []);
        fixture.builder.set_child(function, "body", body);
        fixture
            .builder
            .set_child_list(program, "body", [function, after]);
        let ast = fixture.builder.finish(program);

        let (analyzer, events) = run(&ast);
        assert_eq!(analyzer.into_paths().len(), 2);
        let starts: Vec<_> = events
            .iter()
            .filter(|event| event.starts_with("path-start"))
            .collect();
        assert_eq!(starts, ["path-start:s1", "path-start:s2"]);
        // The nested path closes before the program path does.
        let s2_end = events.iter().position(|e| e == "path-end:s2").unwrap();
        let s1_end = events.iter().position(|e| e == "path-end:s1").unwrap();
        assert!(s2_end < s1_end);
        // `x;` runs in a reachable segment after the function.
        let after_function = events
            .iter()
            .position(|e| e == "leave:FunctionDeclaration")
            .unwrap();
        let enter_after = events
            .iter()
            .position(|e| e == "enter:ExpressionStatement")
            .unwrap();
        assert!(after_function < enter_after);
    }
}
