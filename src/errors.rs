use thiserror::Error;

/// Failures that abort a lint run, as opposed to conditions reported
/// as problems in the output.
#[derive(Debug, Error)]
pub enum LinterError {
    #[error("rule {rule_id:?} errored at line {line}: {message}")]
    RuleError {
        rule_id: String,
        line: usize,
        message: String,
    },

    #[error("rule {rule_id:?} returned a fix but does not declare 'fixable' in its meta")]
    UndeclaredFix { rule_id: String },

    #[error("rule {rule_id:?} returned suggestions but does not declare 'has_suggestions' in its meta")]
    UndeclaredSuggestions { rule_id: String },

    #[error("rule {rule_id:?} reported with unknown message id {message_id:?}")]
    UnknownMessageId {
        rule_id: String,
        message_id: String,
    },

    #[error("rule {rule_id:?} reported without a node or a loc")]
    MissingReportLocation { rule_id: String },

    #[error("rule {rule_id:?} reported without a message or a message id")]
    MissingReportMessage { rule_id: String },

    #[error("rule {rule_id:?} supplied a suggestion without a fix")]
    SuggestionWithoutFix { rule_id: String },

    #[error("rule {rule_id:?} produced overlapping fixes in a single report")]
    ConflictingFix { rule_id: String },

    #[error("rule {rule_id:?} subscribed to {event:?} with a mismatched callback kind")]
    MismatchedListener { rule_id: String, event: String },

    #[error("rule {rule_id:?} has an invalid selector {selector:?}: {message}")]
    InvalidSelector {
        rule_id: String,
        selector: String,
        message: String,
    },

    #[error("no parser configured for raw-text input")]
    MissingParser,

    #[error("parser result is missing {what}")]
    ParserContract { what: &'static str },
}

impl LinterError {
    /// The offending rule, when the failure is attributable to one.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Self::RuleError { rule_id, .. }
            | Self::UndeclaredFix { rule_id }
            | Self::UndeclaredSuggestions { rule_id }
            | Self::UnknownMessageId { rule_id, .. }
            | Self::MissingReportLocation { rule_id }
            | Self::MissingReportMessage { rule_id }
            | Self::SuggestionWithoutFix { rule_id }
            | Self::ConflictingFix { rule_id }
            | Self::MismatchedListener { rule_id, .. }
            | Self::InvalidSelector { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }
}
