use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::rule::Rule;

mod no_debugger;
mod no_empty;
mod no_unreachable;
mod no_var;
mod semi;

pub use no_debugger::no_debugger_rule;
pub use no_empty::no_empty_rule;
pub use no_unreachable::no_unreachable_rule;
pub use no_var::no_var_rule;
pub use semi::semi_rule;

type RuleFactory = fn() -> Rule;

static BUILTIN_RULES: Lazy<BTreeMap<&'static str, RuleFactory>> = Lazy::new(|| {
    BTreeMap::from([
        ("no-debugger", no_debugger_rule as RuleFactory),
        ("no-empty", no_empty_rule as RuleFactory),
        ("no-unreachable", no_unreachable_rule as RuleFactory),
        ("no-var", no_var_rule as RuleFactory),
        ("semi", semi_rule as RuleFactory),
    ])
});

/// Rule ids removed upstream, mapped to their replacements for the
/// "Rule X was removed" diagnostic.
static REPLACED_RULES: Lazy<BTreeMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    BTreeMap::from([
        ("generator-star", &["generator-star-spacing"][..]),
        ("no-comma-dangle", &["comma-dangle"][..]),
        ("no-reserved-keys", &["quote-props"][..]),
        ("no-wrap-func", &["no-extra-parens"][..]),
        ("space-after-function-name", &["space-before-function-paren"][..]),
    ])
});

/// Id → rule lookup: dynamically defined rules shadow the built-in
/// table; built-ins instantiate lazily on first use.
#[derive(Default)]
pub struct RuleRegistry {
    defined: RefCell<BTreeMap<String, Rc<Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&self, rule: Rule) {
        self.defined
            .borrow_mut()
            .insert(rule.name.clone(), Rc::new(rule));
    }

    pub fn get(&self, rule_id: &str) -> Option<Rc<Rule>> {
        if let Some(rule) = self.defined.borrow().get(rule_id) {
            return Some(rule.clone());
        }
        let factory = BUILTIN_RULES.get(rule_id)?;
        let rule = Rc::new(factory());
        self.defined
            .borrow_mut()
            .insert(rule_id.to_owned(), rule.clone());
        Some(rule)
    }

    pub fn replacements(rule_id: &str) -> Option<&'static [&'static str]> {
        REPLACED_RULES.get(rule_id).copied()
    }
}
