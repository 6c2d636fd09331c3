use crate::ast::is_function_kind;
use crate::token_store::CountOptionsBuilder;
use crate::rule::{Rule, RuleBuilder, RuleDocsBuilder, RuleListenerBuilder, RuleMetaBuilder, RuleType};
use crate::violation::ViolationBuilder;

fn allow_empty_catch(options: &[serde_json::Value]) -> bool {
    options
        .first()
        .and_then(|option| option.get("allowEmptyCatch"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

pub fn no_empty_rule() -> Rule {
    RuleBuilder::default()
        .name("no-empty")
        .meta(
            RuleMetaBuilder::default()
                .rule_type(RuleType::Suggestion)
                .docs(RuleDocsBuilder::default()
                    .description("Disallow empty block statements")
                    .recommended(true)
                    .build()
                    .unwrap())
                .messages([("unexpected", "Empty {{type}} statement.")])
                .schema(serde_json::json!([{
                    "type": "object",
                    "properties": { "allowEmptyCatch": { "type": "boolean" } },
                    "additionalProperties": false
                }]))
                .build()
                .unwrap(),
        )
        .create(|_context| {
            vec![
                RuleListenerBuilder::default()
                    .selector("BlockStatement")
                    .on_node(|context, node| {
                        let source_code = context.source_code();
                        let data = source_code.node(node);
                        if !data.child_list("body").is_empty() {
                            return;
                        }
                        // Function bodies may be intentionally empty.
                        let parent_kind = source_code
                            .parent_of(node)
                            .map(|parent| source_code.node(parent).kind().to_owned());
                        match parent_kind.as_deref() {
                            Some(kind) if is_function_kind(kind) => return,
                            Some("CatchClause") if allow_empty_catch(context.options()) => return,
                            _ => {}
                        }
                        // A comment inside the braces counts as content.
                        let has_comment = source_code
                            .tokens()
                            .get_tokens(
                                data.range(),
                                Some(
                                    CountOptionsBuilder::default()
                                        .include_comments(true)
                                        .build()
                                        .unwrap(),
                                ),
                            )
                            .iter()
                            .any(|item| item.is_comment());
                        if has_comment {
                            return;
                        }
                        context.report(
                            ViolationBuilder::default()
                                .node(node)
                                .message_id("unexpected")
                                .data([("type".to_owned(), "block".to_owned())]
                                    .into_iter()
                                    .collect::<std::collections::HashMap<_, _>>())
                                .build()
                                .unwrap(),
                        );
                    })
                    .build()
                    .unwrap(),
                RuleListenerBuilder::default()
                    .selector("SwitchStatement")
                    .on_node(|context, node| {
                        let data = context.source_code().node(node);
                        if !data.child_list("cases").is_empty() {
                            return;
                        }
                        context.report(
                            ViolationBuilder::default()
                                .node(node)
                                .message_id("unexpected")
                                .data([("type".to_owned(), "switch".to_owned())]
                                    .into_iter()
                                    .collect::<std::collections::HashMap<_, _>>())
                                .build()
                                .unwrap(),
                        );
                    })
                    .build()
                    .unwrap(),
            ]
        })
        .build()
        .unwrap()
}
