use std::cell::Cell;
use std::collections::HashMap;

use crate::ast::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    Switch,
    Catch,
    For,
    Class,
}

impl ScopeKind {
    /// Scopes that `var` declarations and `mark_variable_as_used`
    /// treat as hoisting boundaries.
    pub fn is_variable_scope(self) -> bool {
        matches!(self, Self::Global | Self::Module | Self::Function)
    }
}

/// A declared variable. `used` is the only mutable bit: rules flip it
/// through `mark_variable_as_used` while everything else is the scope
/// analyzer's read-only output.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub def_nodes: Vec<NodeId>,
    pub identifiers: Vec<NodeId>,
    used: Cell<bool>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            def_nodes: Default::default(),
            identifiers: Default::default(),
            used: Cell::new(false),
        }
    }

    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    pub fn mark_used(&self) {
        self.used.set(true);
    }
}

#[derive(Debug)]
pub struct Reference {
    pub identifier: NodeId,
    pub resolved: Option<(ScopeId, usize)>,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    pub child_scopes: Vec<ScopeId>,
    pub variables: Vec<Variable>,
    pub references: Vec<Reference>,
    /// References that did not resolve in this scope or any child.
    pub through: Vec<usize>,
}

impl Scope {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }
}

#[derive(Debug)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
    node_to_scope: HashMap<NodeId, ScopeId>,
}

impl ScopeManager {
    pub fn new(scopes: Vec<Scope>, node_to_scope: HashMap<NodeId, ScopeId>) -> Self {
        Self {
            scopes,
            node_to_scope,
        }
    }

    /// An empty manager with only a global scope, for parsers that do
    /// no scope analysis.
    pub fn trivial(program: NodeId) -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                node: program,
                parent: None,
                child_scopes: Default::default(),
                variables: Default::default(),
                references: Default::default(),
                through: Default::default(),
            }],
            node_to_scope: [(program, ScopeId(0))].into_iter().collect(),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(index, scope)| (ScopeId(index), scope))
    }

    /// The scope introduced by `node` itself, if any.
    pub fn acquire(&self, node: NodeId) -> Option<ScopeId> {
        self.node_to_scope.get(&node).copied()
    }

    /// The innermost scope containing `node`, walking the parent table
    /// upward until a scope-introducing node is found.
    pub fn innermost_scope_for(
        &self,
        node: NodeId,
        mut parent_of: impl FnMut(NodeId) -> Option<NodeId>,
    ) -> ScopeId {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(scope) = self.acquire(id) {
                return scope;
            }
            current = parent_of(id);
        }
        self.global_scope()
    }

    /// Walks the scope chain upward from `from` and marks the first
    /// variable named `name` as used. Returns whether one was found.
    pub fn mark_variable_as_used(&self, name: &str, from: ScopeId) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(variable) = scope.variable(name) {
                variable.mark_used();
                return true;
            }
            current = scope.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_nested_function() -> ScopeManager {
        let program = NodeId::from_raw(0);
        let function = NodeId::from_raw(1);
        let mut global = Scope {
            kind: ScopeKind::Global,
            node: program,
            parent: None,
            child_scopes: vec![ScopeId(1)],
            variables: vec![Variable::new("outer")],
            references: Default::default(),
            through: Default::default(),
        };
        global.variables.push(Variable::new("shadowed"));
        let inner = Scope {
            kind: ScopeKind::Function,
            node: function,
            parent: Some(ScopeId(0)),
            child_scopes: Default::default(),
            variables: vec![Variable::new("shadowed")],
            references: Default::default(),
            through: Default::default(),
        };
        ScopeManager::new(
            vec![global, inner],
            [(program, ScopeId(0)), (function, ScopeId(1))]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn test_mark_variable_as_used_walks_upward() {
        let manager = manager_with_nested_function();
        assert!(manager.mark_variable_as_used("outer", ScopeId(1)));
        assert!(manager
            .scope(ScopeId(0))
            .variable("outer")
            .unwrap()
            .is_used());
    }

    #[test]
    fn test_mark_variable_as_used_prefers_innermost() {
        let manager = manager_with_nested_function();
        assert!(manager.mark_variable_as_used("shadowed", ScopeId(1)));
        assert!(manager
            .scope(ScopeId(1))
            .variable("shadowed")
            .unwrap()
            .is_used());
        assert!(!manager
            .scope(ScopeId(0))
            .variable("shadowed")
            .unwrap()
            .is_used());
    }

    #[test]
    fn test_mark_variable_as_used_unknown_name() {
        let manager = manager_with_nested_function();
        assert!(!manager.mark_variable_as_used("nope", ScopeId(1)));
    }
}
