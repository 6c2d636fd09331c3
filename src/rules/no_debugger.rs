use crate::rule::{Rule, RuleBuilder, RuleDocsBuilder, RuleListenerBuilder, RuleMetaBuilder, RuleType};
use crate::violation::ViolationBuilder;

pub fn no_debugger_rule() -> Rule {
    RuleBuilder::default()
        .name("no-debugger")
        .meta(
            RuleMetaBuilder::default()
                .rule_type(RuleType::Problem)
                .docs(RuleDocsBuilder::default()
                    .description("Disallow the use of `debugger`")
                    .recommended(true)
                    .build()
                    .unwrap())
                .messages([("unexpected", "Unexpected 'debugger' statement.")])
                .schema(serde_json::json!([]))
                .build()
                .unwrap(),
        )
        .create(|_context| {
            vec![RuleListenerBuilder::default()
                .selector("DebuggerStatement")
                .on_node(|context, node| {
                    context.report(
                        ViolationBuilder::default()
                            .node(node)
                            .message_id("unexpected")
                            .build()
                            .unwrap(),
                    );
                })
                .build()
                .unwrap()]
        })
        .build()
        .unwrap()
}
