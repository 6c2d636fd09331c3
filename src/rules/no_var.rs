use crate::rule::{Fixable, Rule, RuleBuilder, RuleListenerBuilder, RuleMetaBuilder, RuleType};
use crate::violation::ViolationBuilder;

pub fn no_var_rule() -> Rule {
    RuleBuilder::default()
        .name("no-var")
        .meta(
            RuleMetaBuilder::default()
                .rule_type(RuleType::Suggestion)
                .docs(crate::rule::RuleDocsBuilder::default()
                    .description("Require `let` or `const` instead of `var`")
                    .build()
                    .unwrap())
                .fixable(Fixable::Code)
                .messages([("unexpectedVar", "Unexpected var, use let or const instead.")])
                .schema(serde_json::json!([]))
                .build()
                .unwrap(),
        )
        .create(|_context| {
            vec![RuleListenerBuilder::default()
                .selector("VariableDeclaration[kind=var]")
                .on_node(|context, node| {
                    let source_code = context.source_code();
                    let Some(var_token) = source_code
                        .tokens()
                        .get_first_token(source_code.node(node).range(), None::<usize>)
                    else {
                        return;
                    };
                    let keyword_range = var_token.range();
                    context.report(
                        ViolationBuilder::default()
                            .node(node)
                            .message_id("unexpectedVar")
                            .fix(move |fixer| fixer.replace_text_range(keyword_range, "let"))
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
