//! Failure classification: transient or permanent.
//!
//! The decision is made from the free text printed by the interpreter, which
//! depends on the wording (and locale) of the scripting tool. The phrase list
//! is therefore kept explicit and extensible: callers add their own phrases
//! through [`TransientClassifier::with_phrases`], typically from the
//! `invoker.transient_phrases` configuration key.

use super::context::{CallContext, ContextError};
use super::executor::{ExecFailure, ExecOutcome};

/// Built-in transient indicators, matched case-insensitively.
///
/// - `-1712`: AppleEvent timed out (application busy)
/// - `-609`: connection is invalid (application relaunching)
pub const DEFAULT_TRANSIENT_PHRASES: &[&str] = &[
    "timed out",
    "(-1712)",
    "connection is invalid",
    "(-609)",
];

/// Classified result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Success(String),
    TransientFailure { output: String, cause: String },
    PermanentFailure { output: String, cause: String },
    /// The caller's own context fired; never retried.
    Interrupted(ContextError),
}

impl RetryOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, RetryOutcome::TransientFailure { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TransientClassifier {
    phrases: Vec<String>,
}

impl Default for TransientClassifier {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_TRANSIENT_PHRASES
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }
}

impl TransientClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A classifier without any phrase: every failure is permanent until
    /// phrases are added.
    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
        }
    }

    /// Adds phrases to the list. Blank phrases are ignored, since they would
    /// match every output.
    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if !phrase.is_empty() && !self.phrases.contains(&phrase) {
                self.phrases.push(phrase);
            }
        }
        self
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if `output` contains one of the transient indicators.
    pub fn is_transient_text(&self, output: &str) -> bool {
        let lowered = output.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    /// Classifies one attempt.
    ///
    /// The caller's context is checked first: once it has fired, a failure is
    /// reported as [`RetryOutcome::Interrupted`] whatever the output says.
    pub fn classify(&self, ctx: &CallContext, outcome: &ExecOutcome) -> RetryOutcome {
        let output = outcome.text();
        let Some(failure) = &outcome.failure else {
            return RetryOutcome::Success(output);
        };

        if let ExecFailure::Context(err) = failure {
            return RetryOutcome::Interrupted(*err);
        }
        if let Some(err) = ctx.err() {
            return RetryOutcome::Interrupted(err);
        }

        let cause = failure.to_string();
        if self.is_transient_text(&output) {
            RetryOutcome::TransientFailure { output, cause }
        } else {
            RetryOutcome::PermanentFailure { output, cause }
        }
    }
}
