use crate::ast::{NodeChild, NodeId};
use crate::source_code::SourceCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    /// Suppress descent into the current node. Its leave event still
    /// fires.
    SkipChildren,
    /// Abort the entire walk.
    Stop,
}

pub trait AstVisitor {
    fn enter_node(&mut self, node: NodeId, parent: Option<NodeId>) -> VisitAction;
    fn leave_node(&mut self, node: NodeId, parent: Option<NodeId>) -> VisitAction;
}

/// Depth-first walk from the root: `enter`, children in visitor-key
/// order, `leave`. Installs parent backlinks as it descends; that is
/// its only mutation of per-file state.
pub fn walk_ast(source_code: &SourceCode, visitor: &mut impl AstVisitor) {
    visit(source_code, visitor, source_code.ast().root(), None);
}

fn visit(
    source_code: &SourceCode,
    visitor: &mut impl AstVisitor,
    node: NodeId,
    parent: Option<NodeId>,
) -> bool {
    match visitor.enter_node(node, parent) {
        VisitAction::Stop => return false,
        VisitAction::SkipChildren => {}
        VisitAction::Continue => {
            if !visit_children(source_code, visitor, node) {
                return false;
            }
        }
    }
    visitor.leave_node(node, parent) != VisitAction::Stop
}

fn visit_children(
    source_code: &SourceCode,
    visitor: &mut impl AstVisitor,
    node: NodeId,
) -> bool {
    let data = source_code.node(node);
    match source_code.visitor_keys().keys_for(data.kind()) {
        Some(keys) => {
            for key in keys {
                if !visit_child_slot(source_code, visitor, node, key) {
                    return false;
                }
            }
        }
        None => {
            // Unknown kind: fall back to the node's own child keys.
            let keys: Vec<String> = data.own_child_keys().map(str::to_owned).collect();
            for key in &keys {
                if !visit_child_slot(source_code, visitor, node, key) {
                    return false;
                }
            }
        }
    }
    true
}

fn visit_child_slot(
    source_code: &SourceCode,
    visitor: &mut impl AstVisitor,
    node: NodeId,
    key: &str,
) -> bool {
    // Absent slots are the null/undefined children of the tree; they
    // are skipped silently.
    let Some(slot) = source_code.node(node).child_slot(key) else {
        return true;
    };
    match slot {
        NodeChild::Single(child) => {
            let child = *child;
            source_code.set_parent(child, node);
            visit(source_code, visitor, child, Some(node))
        }
        NodeChild::Many(children) => {
            let children = children.clone();
            for child in children {
                source_code.set_parent(child, node);
                if !visit(source_code, visitor, child, Some(node)) {
                    return false;
                }
            }
            true
        }
    }
}
