use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use derive_builder::Builder;
use serde_json::Value;

use crate::ast::NodeId;
use crate::code_path_analysis::{CodePath, CodePathSegment};
use crate::context::RuleContext;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuleType {
    Problem,
    Suggestion,
    Layout,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fixable {
    Code,
    Whitespace,
}

#[derive(Builder, Clone, Debug, Default)]
#[builder(setter(into, strip_option), default)]
pub struct RuleDocs {
    pub description: String,
    pub recommended: bool,
    pub url: Option<String>,
}

#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option))]
pub struct RuleMeta {
    pub rule_type: RuleType,
    #[builder(default)]
    pub docs: RuleDocs,
    #[builder(default)]
    pub fixable: Option<Fixable>,
    #[builder(default)]
    pub has_suggestions: bool,
    #[builder(setter(custom), default)]
    pub messages: HashMap<String, String>,
    #[builder(default)]
    pub schema: Option<Value>,
    #[builder(default)]
    pub deprecated: bool,
    #[builder(default)]
    pub replaced_by: Vec<String>,
}

impl RuleMetaBuilder {
    pub fn messages<'a>(
        &mut self,
        messages: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        self.messages = Some(
            messages
                .into_iter()
                .map(|(id, template)| (id.to_owned(), template.to_owned()))
                .collect(),
        );
        self
    }
}

pub type RuleCreateFn = Rc<dyn Fn(&RuleContext) -> Vec<RuleListener>>;

/// The rule contract: metadata plus a `create` invoked exactly once
/// per file to obtain listeners.
#[derive(Builder, Clone)]
#[builder(setter(into))]
pub struct Rule {
    pub name: String,
    pub meta: RuleMeta,
    #[builder(setter(custom))]
    pub create: RuleCreateFn,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish()
    }
}

impl RuleBuilder {
    pub fn create(
        &mut self,
        callback: impl Fn(&RuleContext) -> Vec<RuleListener> + 'static,
    ) -> &mut Self {
        self.create = Some(Rc::new(callback));
        self
    }
}

#[derive(Clone)]
pub enum RuleListenerCallback {
    Node(Rc<dyn Fn(&RuleContext, NodeId)>),
    CodePath(Rc<dyn Fn(&RuleContext, &CodePath, NodeId)>),
    Segment(Rc<dyn Fn(&RuleContext, &CodePath, &CodePathSegment, NodeId)>),
    SegmentLoop(Rc<dyn Fn(&RuleContext, &CodePath, &CodePathSegment, &CodePathSegment, NodeId)>),
}

/// One subscription: a selector (or reserved code-path event name)
/// bound to a callback.
#[derive(Builder, Clone)]
#[builder(setter(into))]
pub struct RuleListener {
    pub selector: String,
    #[builder(setter(custom))]
    pub callback: RuleListenerCallback,
}

impl RuleListenerBuilder {
    pub fn on_node(&mut self, callback: impl Fn(&RuleContext, NodeId) + 'static) -> &mut Self {
        self.callback = Some(RuleListenerCallback::Node(Rc::new(callback)));
        self
    }

    pub fn on_code_path(
        &mut self,
        callback: impl Fn(&RuleContext, &CodePath, NodeId) + 'static,
    ) -> &mut Self {
        self.callback = Some(RuleListenerCallback::CodePath(Rc::new(callback)));
        self
    }

    pub fn on_segment(
        &mut self,
        callback: impl Fn(&RuleContext, &CodePath, &CodePathSegment, NodeId) + 'static,
    ) -> &mut Self {
        self.callback = Some(RuleListenerCallback::Segment(Rc::new(callback)));
        self
    }

    pub fn on_segment_loop(
        &mut self,
        callback: impl Fn(&RuleContext, &CodePath, &CodePathSegment, &CodePathSegment, NodeId)
            + 'static,
    ) -> &mut Self {
        self.callback = Some(RuleListenerCallback::SegmentLoop(Rc::new(callback)));
        self
    }
}
