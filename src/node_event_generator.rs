use std::collections::{HashMap, HashSet};

use crate::ast::{Ast, NodeId};
use crate::errors::LinterError;
use crate::event_emitter::{EventEmitter, EventPayload};
use crate::selectors::ParsedSelector;

struct CompiledSelector {
    selector: ParsedSelector,
    registration_index: usize,
}

/// Maps AST enter/leave into selector events: selectors are bucketed
/// by subject kind (wildcards separately), matched against the node
/// and its ancestors, and emitted most-specific first with ties broken
/// by registration index.
#[derive(Default)]
pub struct NodeEventGenerator {
    selectors: Vec<CompiledSelector>,
    seen: HashSet<String>,
    enter_by_kind: HashMap<String, Vec<usize>>,
    exit_by_kind: HashMap<String, Vec<usize>>,
    any_enter: Vec<usize>,
    any_exit: Vec<usize>,
}

impl NodeEventGenerator {
    pub fn add(&mut self, selector: ParsedSelector, registration_index: usize) {
        if !self.seen.insert(selector.raw().to_owned()) {
            return;
        }
        let index = self.selectors.len();
        let target_kind = selector.target_kind().map(str::to_owned);
        let is_exit = selector.is_exit();
        self.selectors.push(CompiledSelector {
            selector,
            registration_index,
        });
        match (target_kind, is_exit) {
            (Some(kind), false) => self.enter_by_kind.entry(kind).or_default().push(index),
            (Some(kind), true) => self.exit_by_kind.entry(kind).or_default().push(index),
            (None, false) => self.any_enter.push(index),
            (None, true) => self.any_exit.push(index),
        }
    }

    fn applicable(&self, kind: &str, exit: bool) -> Vec<&CompiledSelector> {
        let (by_kind, any) = if exit {
            (&self.exit_by_kind, &self.any_exit)
        } else {
            (&self.enter_by_kind, &self.any_enter)
        };
        let mut candidates: Vec<&CompiledSelector> = by_kind
            .get(kind)
            .into_iter()
            .flatten()
            .chain(any)
            .map(|&index| &self.selectors[index])
            .collect();
        candidates.sort_by(|a, b| {
            b.selector
                .specificity()
                .cmp(&a.selector.specificity())
                .then(a.registration_index.cmp(&b.registration_index))
        });
        candidates
    }

    pub fn enter_node(
        &self,
        ast: &Ast,
        node: NodeId,
        ancestors: &[NodeId],
        emitter: &EventEmitter,
    ) -> Result<(), LinterError> {
        self.dispatch(ast, node, ancestors, emitter, false)
    }

    pub fn leave_node(
        &self,
        ast: &Ast,
        node: NodeId,
        ancestors: &[NodeId],
        emitter: &EventEmitter,
    ) -> Result<(), LinterError> {
        self.dispatch(ast, node, ancestors, emitter, true)
    }

    fn dispatch(
        &self,
        ast: &Ast,
        node: NodeId,
        ancestors: &[NodeId],
        emitter: &EventEmitter,
        exit: bool,
    ) -> Result<(), LinterError> {
        for candidate in self.applicable(ast.kind(node), exit) {
            if candidate.selector.matches(ast, node, ancestors) {
                emitter.emit(candidate.selector.raw(), &EventPayload::Node { node })?;
            }
        }
        Ok(())
    }
}
