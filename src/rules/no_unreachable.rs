use std::cell::RefCell;
use std::rc::Rc;

use crate::rule::{Rule, RuleBuilder, RuleDocsBuilder, RuleListenerBuilder, RuleMetaBuilder, RuleType};
use crate::violation::ViolationBuilder;

const STATEMENT_SELECTORS: &[&str] = &[
    "ExpressionStatement",
    "VariableDeclaration",
    "ReturnStatement",
    "ThrowStatement",
    "BreakStatement",
    "ContinueStatement",
    "DebuggerStatement",
    "IfStatement",
    "WhileStatement",
    "DoWhileStatement",
    "ForStatement",
    "ForInStatement",
    "ForOfStatement",
    "SwitchStatement",
    "TryStatement",
];

pub fn no_unreachable_rule() -> Rule {
    RuleBuilder::default()
        .name("no-unreachable")
        .meta(
            RuleMetaBuilder::default()
                .rule_type(RuleType::Problem)
                .docs(RuleDocsBuilder::default()
                    .description(
                        "Disallow unreachable code after return, throw, continue, and break",
                    )
                    .recommended(true)
                    .build()
                    .unwrap())
                .messages([("unreachableCode", "Unreachable code.")])
                .schema(serde_json::json!([]))
                .build()
                .unwrap(),
        )
        .create(|_context| {
            // Reachability per code path; nested functions push their
            // own frame so the program's state survives them.
            let reachable_stack: Rc<RefCell<Vec<bool>>> = Default::default();
            let mut listeners = Vec::new();

            {
                let reachable_stack = reachable_stack.clone();
                listeners.push(
                    RuleListenerBuilder::default()
                        .selector("onCodePathStart")
                        .on_code_path(move |_context, _code_path, _node| {
                            reachable_stack.borrow_mut().push(true);
                        })
                        .build()
                        .unwrap(),
                );
            }
            {
                let reachable_stack = reachable_stack.clone();
                listeners.push(
                    RuleListenerBuilder::default()
                        .selector("onCodePathEnd")
                        .on_code_path(move |_context, _code_path, _node| {
                            reachable_stack.borrow_mut().pop();
                        })
                        .build()
                        .unwrap(),
                );
            }
            {
                let reachable_stack = reachable_stack.clone();
                listeners.push(
                    RuleListenerBuilder::default()
                        .selector("onCodePathSegmentStart")
                        .on_segment(move |_context, _code_path, segment, _node| {
                            if let Some(top) = reachable_stack.borrow_mut().last_mut() {
                                *top = segment.reachable;
                            }
                        })
                        .build()
                        .unwrap(),
                );
            }

            for selector in STATEMENT_SELECTORS {
                let reachable_stack = reachable_stack.clone();
                listeners.push(
                    RuleListenerBuilder::default()
                        .selector(*selector)
                        .on_node(move |context, node| {
                            if reachable_stack.borrow().last().copied().unwrap_or(true) {
                                return;
                            }
                            let data = context.source_code().node(node);
                            // Hoisting: `var` without initializers and
                            // function declarations still take effect.
                            if data.kind() == "VariableDeclaration"
                                && data.string_attribute("kind") == Some("var")
                                && data.child_list("declarations").iter().all(|&declarator| {
                                    context
                                        .source_code()
                                        .node(declarator)
                                        .child("init")
                                        .is_none()
                                })
                            {
                                return;
                            }
                            context.report(
                                ViolationBuilder::default()
                                    .node(node)
                                    .message_id("unreachableCode")
                                    .build()
                                    .unwrap(),
                            );
                        })
                        .build()
                        .unwrap(),
                );
            }

            listeners
        })
        .build()
        .unwrap()
}
