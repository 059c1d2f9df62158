//! Free-text request classification.
//!
//! # Responsibility
//! - Map user text to a structured [`Intent`]: a schedule lookup or a booking.
//! - Try cheap local matching first and an external language model second.
//!
//! # Invariants
//! - A resolver that cannot classify the text returns `Ok(None)`; errors are
//!   reserved for transport or decoding failures of an external collaborator.
//! - Resolvers never log the request text.

pub mod gemini;
pub mod keyword;
pub mod model;

pub use model::{ModelClient, ModelIntentResolver};

use crate::model::person::RoleFilter;
use chrono::NaiveDateTime;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lesson length used when a booking does not state one.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Classified purpose of a free-text request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Weekly schedule lookup for one person.
    Query { person: String, role: RoleFilter },
    /// Request to create one lesson.
    Book(BookIntent),
}

/// Booking fields extracted from text. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookIntent {
    pub teacher: Option<String>,
    pub student: Option<String>,
    pub subject: Option<String>,
    pub room: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug)]
pub enum IntentError {
    /// External resolver is missing required configuration.
    NotConfigured(&'static str),
    /// Request to the external model failed before a response arrived.
    Transport(String),
    /// External model answered with a non-success HTTP status.
    Status(u16),
    /// External model response could not be decoded.
    Decode(String),
}

impl Display for IntentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured(what) => write!(f, "intent model is not configured: {what}"),
            Self::Transport(message) => write!(f, "intent model request failed: {message}"),
            Self::Status(code) => write!(f, "intent model returned HTTP {code}"),
            Self::Decode(message) => write!(f, "intent model response is invalid: {message}"),
        }
    }
}

impl Error for IntentError {}

/// Capability that classifies free text.
pub trait IntentResolver {
    /// Short stable name used in log events.
    fn name(&self) -> &'static str;

    fn resolve(&self, text: &str) -> Result<Option<Intent>, IntentError>;
}

/// Runs resolvers in order and returns the first classification.
#[derive(Default)]
pub struct ChainedIntentResolver<'a> {
    resolvers: Vec<&'a dyn IntentResolver>,
}

impl<'a> ChainedIntentResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver consulted after all previously added ones.
    pub fn then(mut self, resolver: &'a dyn IntentResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }
}

impl IntentResolver for ChainedIntentResolver<'_> {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn resolve(&self, text: &str) -> Result<Option<Intent>, IntentError> {
        for resolver in &self.resolvers {
            match resolver.resolve(text) {
                Ok(Some(intent)) => {
                    info!(
                        "event=intent_resolve module=intent status=ok resolver={} kind={}",
                        resolver.name(),
                        intent_kind(&intent)
                    );
                    return Ok(Some(intent));
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        "event=intent_resolve module=intent status=error resolver={} error={}",
                        resolver.name(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        info!("event=intent_resolve module=intent status=skip reason=unresolved");
        Ok(None)
    }
}

fn intent_kind(intent: &Intent) -> &'static str {
    match intent {
        Intent::Query { .. } => "query",
        Intent::Book(_) => "book",
    }
}

#[cfg(test)]
mod tests {
    use super::{ChainedIntentResolver, Intent, IntentError, IntentResolver};
    use crate::model::person::RoleFilter;

    struct Fixed(Option<Intent>);

    impl IntentResolver for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn resolve(&self, _text: &str) -> Result<Option<Intent>, IntentError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl IntentResolver for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn resolve(&self, _text: &str) -> Result<Option<Intent>, IntentError> {
            Err(IntentError::Status(503))
        }
    }

    fn query(person: &str) -> Intent {
        Intent::Query {
            person: person.to_string(),
            role: RoleFilter::Teacher,
        }
    }

    #[test]
    fn first_classification_wins() {
        let first = Fixed(Some(query("Adina")));
        let second = Fixed(Some(query("Assel")));
        let chain = ChainedIntentResolver::new().then(&first).then(&second);
        assert_eq!(chain.resolve("x").unwrap(), Some(query("Adina")));
    }

    #[test]
    fn falls_through_to_next_resolver() {
        let first = Fixed(None);
        let second = Fixed(Some(query("Assel")));
        let chain = ChainedIntentResolver::new().then(&first).then(&second);
        assert_eq!(chain.resolve("x").unwrap(), Some(query("Assel")));
    }

    #[test]
    fn fallback_error_is_surfaced() {
        let first = Fixed(None);
        let chain = ChainedIntentResolver::new().then(&first).then(&Failing);
        assert!(matches!(chain.resolve("x"), Err(IntentError::Status(503))));
    }

    #[test]
    fn empty_chain_is_unresolved() {
        assert_eq!(ChainedIntentResolver::new().resolve("x").unwrap(), None);
    }
}
