use thiserror::Error;

use crate::invoker::ContextError;

#[derive(Error, Debug)]
pub enum ControlError {
    /// Une erreur transitoire a persisté sur toutes les tentatives.
    #[error("{label} still failing after {attempts} attempt(s): {output}")]
    TransientExhausted {
        label: String,
        attempts: usize,
        output: String,
        cause: String,
    },
    /// Erreur définitive : jamais réessayée.
    #[error("{label} failed ({cause}): {output}")]
    PermanentExecution {
        label: String,
        output: String,
        cause: String,
    },
    /// L'appelant a annulé l'appel ou son échéance est dépassée.
    #[error("Interrupted: {0}")]
    Interrupted(ContextError),
    #[error("{kind} '{query}' is ambiguous, {} candidates match", .matches.len())]
    Ambiguous {
        kind: String,
        query: String,
        /// (identifier, display name) of every tied candidate, in rank order.
        matches: Vec<(String, String)>,
    },
    #[error("No {kind} matches '{query}'")]
    NotFound { kind: String, query: String },
    #[error("Cannot parse {0}")]
    ParsingError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ControlError {
    pub fn parsing(what: &str, detail: impl std::fmt::Display) -> Self {
        ControlError::ParsingError(format!("{}: {}", what, detail))
    }

    pub fn not_found(kind: &str, query: &str) -> Self {
        ControlError::NotFound {
            kind: kind.to_string(),
            query: query.to_string(),
        }
    }

    /// True for errors caused by the caller giving up rather than by the
    /// operation itself.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ControlError::Interrupted(_))
    }

    /// True for resolution outcomes that the user can fix by refining the query.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            ControlError::Ambiguous { .. } | ControlError::NotFound { .. }
        )
    }
}
