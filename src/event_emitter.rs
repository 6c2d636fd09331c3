use std::collections::HashMap;

use crate::ast::NodeId;
use crate::code_path_analysis::{CodePath, CodePathSegment};
use crate::errors::LinterError;

/// Reserved event names rules subscribe to for control-flow analysis,
/// alongside ordinary selectors.
pub const CODE_PATH_EVENTS: &[&str] = &[
    "onCodePathStart",
    "onCodePathEnd",
    "onCodePathSegmentStart",
    "onCodePathSegmentEnd",
    "onCodePathSegmentLoop",
];

pub fn is_code_path_event(name: &str) -> bool {
    CODE_PATH_EVENTS.contains(&name)
}

/// What an event delivers to its listeners.
pub enum EventPayload<'a> {
    Node {
        node: NodeId,
    },
    CodePath {
        code_path: &'a CodePath,
        node: NodeId,
    },
    Segment {
        code_path: &'a CodePath,
        segment: &'a CodePathSegment,
        node: NodeId,
    },
    SegmentLoop {
        code_path: &'a CodePath,
        from: &'a CodePathSegment,
        to: &'a CodePathSegment,
        node: NodeId,
    },
}

pub type Listener = Box<dyn Fn(&EventPayload<'_>) -> Result<(), LinterError>>;

/// Pub/sub keyed by event name (a selector string or a reserved
/// code-path event). `emit` stops at the first listener error and
/// propagates it.
#[derive(Default)]
pub struct EventEmitter {
    listeners: HashMap<String, Vec<Listener>>,
    first_registration: HashMap<String, usize>,
    registration_counter: usize,
}

impl EventEmitter {
    pub fn on(&mut self, event: impl Into<String>, listener: Listener) {
        let event = event.into();
        self.first_registration
            .entry(event.clone())
            .or_insert(self.registration_counter);
        self.registration_counter += 1;
        self.listeners.entry(event).or_default().push(listener);
    }

    pub fn emit(&self, event: &str, payload: &EventPayload<'_>) -> Result<(), LinterError> {
        if let Some(listeners) = self.listeners.get(event) {
            for listener in listeners {
                listener(payload)?;
            }
        }
        Ok(())
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(|name| &**name)
    }

    /// Index of the first subscription for this event name; the
    /// deterministic tie-breaker for equal-specificity selectors.
    pub fn registration_index(&self, event: &str) -> usize {
        self.first_registration.get(event).copied().unwrap_or(usize::MAX)
    }
}
