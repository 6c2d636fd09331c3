use crate::ast::{NodeId, SourceLocation, TokenKind};
use crate::context::RuleContext;
use crate::rule::{Fixable, Rule, RuleBuilder, RuleDocsBuilder, RuleListenerBuilder, RuleMetaBuilder, RuleType};
use crate::violation::ViolationBuilder;

const STATEMENT_SELECTORS: &[&str] = &[
    "ExpressionStatement",
    "VariableDeclaration",
    "ReturnStatement",
    "ThrowStatement",
    "BreakStatement",
    "ContinueStatement",
    "DebuggerStatement",
];

fn wants_semicolons(context: &RuleContext) -> bool {
    context
        .options()
        .first()
        .and_then(|option| option.as_str())
        .map_or(true, |mode| mode == "always")
}

/// Declarations serving as `for`-loop heads carry no semicolon of
/// their own.
fn is_loop_head(context: &RuleContext, node: NodeId) -> bool {
    if context.source_code().node(node).kind() != "VariableDeclaration" {
        return false;
    }
    matches!(
        context
            .source_code()
            .parent_of(node)
            .map(|parent| context.source_code().node(parent).kind().to_owned())
            .as_deref(),
        Some("ForStatement" | "ForInStatement" | "ForOfStatement")
    )
}

fn check_statement(context: &RuleContext, node: NodeId) {
    if is_loop_head(context, node) {
        return;
    }
    let source_code = context.source_code();
    let range = source_code.node(node).range();
    let Some(last_token) = source_code.tokens().get_last_token(range, None::<usize>) else {
        return;
    };
    let has_semi = last_token.as_token().map_or(false, |token| {
        token.kind == TokenKind::Punctuator && token.value == ";"
    });

    if wants_semicolons(context) {
        if !has_semi {
            let end = last_token.loc().end;
            let insert_at = last_token.range().collapsed_end();
            context.report(
                ViolationBuilder::default()
                    .node(node)
                    .loc(SourceLocation::new(end, end))
                    .message_id("missingSemi")
                    .fix(move |fixer| fixer.insert_text_after_range(insert_at, ";"))
                    .build()
                    .unwrap(),
            );
        }
    } else if has_semi {
        let semi_range = last_token.range();
        let loc = last_token.loc();
        context.report(
            ViolationBuilder::default()
                .node(node)
                .loc(loc)
                .message_id("extraSemi")
                .fix(move |fixer| fixer.remove_range(semi_range))
                .build()
                .unwrap(),
        );
    }
}

pub fn semi_rule() -> Rule {
    RuleBuilder::default()
        .name("semi")
        .meta(
            RuleMetaBuilder::default()
                .rule_type(RuleType::Layout)
                .docs(RuleDocsBuilder::default()
                    .description("Require or disallow semicolons instead of ASI")
                    .build()
                    .unwrap())
                .fixable(Fixable::Code)
                .messages([
                    ("missingSemi", "Missing semicolon."),
                    ("extraSemi", "Extra semicolon."),
                ])
                .schema(serde_json::json!([{ "enum": ["always", "never"] }]))
                .build()
                .unwrap(),
        )
        .create(|_context| {
            STATEMENT_SELECTORS
                .iter()
                .map(|selector| {
                    RuleListenerBuilder::default()
                        .selector(*selector)
                        .on_node(check_statement)
                        .build()
                        .unwrap()
                })
                .collect()
        })
        .build()
        .unwrap()
}
