use std::rc::Rc;

use derive_builder::Builder;
use serde_json::Value;

use crate::config::{LintConfigBuilder, RuleEntry, Severity};
use crate::linter::{Linter, SourceInput, VerifyOptions};
use crate::rule::Rule;
use crate::source_code::Parser;
use crate::violation::LintMessage;

/// Per-rule test harness: valid cases must produce no problems,
/// invalid cases must produce exactly the expected errors and, for
/// fixable rules, the expected output after fixing.
pub struct RuleTester {
    rule: Rule,
    rule_tests: RuleTests,
    parser: Rc<dyn Parser>,
}

#[derive(Default)]
pub struct RuleTests {
    pub valid: Vec<RuleTestValid>,
    pub invalid: Vec<RuleTestInvalid>,
}

#[derive(Builder, Clone, Debug, Default)]
#[builder(default, setter(into, strip_option))]
pub struct RuleTestValid {
    pub code: String,
    pub options: Vec<Value>,
    pub only: bool,
}

impl From<&str> for RuleTestValid {
    fn from(code: &str) -> Self {
        Self {
            code: code.to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Builder, Clone, Debug, Default)]
#[builder(default, setter(into, strip_option))]
pub struct RuleTestInvalid {
    pub code: String,
    pub options: Vec<Value>,
    pub errors: Vec<RuleTestExpectedError>,
    pub output: Option<String>,
    pub only: bool,
}

#[derive(Builder, Clone, Debug, Default)]
#[builder(default, setter(into, strip_option))]
pub struct RuleTestExpectedError {
    pub message: Option<String>,
    pub message_id: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl RuleTester {
    fn new(rule: Rule, rule_tests: RuleTests, parser: Rc<dyn Parser>) -> Self {
        if rule.meta.fixable.is_none()
            && rule_tests
                .invalid
                .iter()
                .any(|invalid_test| invalid_test.output.is_some())
        {
            panic!("Specified 'output' for a non-fixable rule");
        }
        Self {
            rule,
            rule_tests,
            parser,
        }
    }

    pub fn run(rule: Rule, rule_tests: RuleTests, parser: Rc<dyn Parser>) {
        Self::new(rule, rule_tests, parser).run_tests()
    }

    fn run_tests(&self) {
        if let Some(only_valid_test) = self
            .rule_tests
            .valid
            .iter()
            .find(|valid_test| valid_test.only)
        {
            self.run_valid_test(only_valid_test);
            return;
        }
        if let Some(only_invalid_test) = self
            .rule_tests
            .invalid
            .iter()
            .find(|invalid_test| invalid_test.only)
        {
            self.run_invalid_test(only_invalid_test);
            return;
        }

        for valid_test in &self.rule_tests.valid {
            self.run_valid_test(valid_test);
        }
        for invalid_test in &self.rule_tests.invalid {
            self.run_invalid_test(invalid_test);
        }
    }

    fn linter_and_config(&self, options: &[Value]) -> (Linter, crate::config::LintConfig) {
        let linter = Linter::new();
        linter.define_rule(self.rule.clone());
        let mut language_options = crate::config::LanguageOptions::default();
        language_options.parser = Some(self.parser.clone());
        let config = LintConfigBuilder::default()
            .rules([(
                self.rule.name.clone(),
                RuleEntry {
                    severity: Severity::Error,
                    options: options.to_vec(),
                },
            )]
            .into_iter()
            .collect::<std::collections::BTreeMap<_, _>>())
            .language_options(language_options)
            .build()
            .unwrap();
        (linter, config)
    }

    fn run_valid_test(&self, valid_test: &RuleTestValid) {
        let (linter, config) = self.linter_and_config(&valid_test.options);
        let messages = linter
            .verify(
                SourceInput::Text(&valid_test.code),
                &config,
                &VerifyOptions::default(),
            )
            .unwrap_or_else(|error| {
                panic!("Valid case errored\ntest: {valid_test:#?}\nerror: {error}")
            });
        assert!(
            messages.is_empty(),
            "Valid case failed\ntest: {valid_test:#?}\nmessages: {messages:#?}"
        );
    }

    fn run_invalid_test(&self, invalid_test: &RuleTestInvalid) {
        let (linter, config) = self.linter_and_config(&invalid_test.options);
        let messages = linter
            .verify(
                SourceInput::Text(&invalid_test.code),
                &config,
                &VerifyOptions::default(),
            )
            .unwrap_or_else(|error| {
                panic!("Invalid case errored\ntest: {invalid_test:#?}\nerror: {error}")
            });
        self.check_expected_errors(invalid_test, &messages);

        if let Some(expected_output) = &invalid_test.output {
            let report = linter
                .verify_and_fix(&invalid_test.code, &config, &VerifyOptions::default())
                .unwrap_or_else(|error| {
                    panic!("Fixing errored\ntest: {invalid_test:#?}\nerror: {error}")
                });
            assert_eq!(
                &report.output, expected_output,
                "Fix output mismatch\ntest: {invalid_test:#?}"
            );
        }
    }

    fn check_expected_errors(&self, invalid_test: &RuleTestInvalid, messages: &[LintMessage]) {
        assert_eq!(
            messages.len(),
            invalid_test.errors.len(),
            "Wrong number of errors\ntest: {invalid_test:#?}\nmessages: {messages:#?}"
        );
        for (expected, actual) in invalid_test.errors.iter().zip(messages) {
            if let Some(message) = &expected.message {
                assert_eq!(
                    &actual.message, message,
                    "Message mismatch\ntest: {invalid_test:#?}\nactual: {actual:#?}"
                );
            }
            if let Some(message_id) = &expected.message_id {
                assert_eq!(
                    actual.message_id.as_ref(),
                    Some(message_id),
                    "Message id mismatch\ntest: {invalid_test:#?}\nactual: {actual:#?}"
                );
            }
            if let Some(line) = expected.line {
                assert_eq!(
                    actual.line, line,
                    "Line mismatch\ntest: {invalid_test:#?}\nactual: {actual:#?}"
                );
            }
            if let Some(column) = expected.column {
                assert_eq!(
                    actual.column, column,
                    "Column mismatch\ntest: {invalid_test:#?}\nactual: {actual:#?}"
                );
            }
        }
    }
}
