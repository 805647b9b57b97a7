//! Resilient invocation of external scripting tools.
//!
//! One call to [`Invoker::invoke`] is a bounded, strictly sequential attempt
//! sequence:
//!
//! ```text
//! Attempting ──success──────────────────────────────▶ Ok(output)
//!     │
//!     └─failure─▶ Classify ──transient, budget left──▶ sleep ─▶ Attempting
//!                     ├──────transient, budget spent─▶ TransientExhausted
//!                     ├──────permanent───────────────▶ PermanentExecution
//!                     └──────context fired───────────▶ Interrupted
//! ```
//!
//! The executor and the sleeper are injected, and the invoker holds no state
//! between calls: it can be shared by concurrent independent operations.

mod backoff;
mod classify;
mod context;
mod executor;
mod sleeper;

pub use backoff::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF, RetryPolicy,
};
pub use classify::{DEFAULT_TRANSIENT_PHRASES, RetryOutcome, TransientClassifier};
pub use context::{CallContext, ContextError};
pub use executor::{
    CommandSpec, DEFAULT_INTERPRETER, ExecFailure, ExecOutcome, Executor, ProcessExecutor,
};
pub use sleeper::{Sleeper, TokioSleeper};

use tracing::{debug, warn};

use crate::errors::ControlError;

/// Invoker wired with the real process executor and tokio timer.
pub type SystemInvoker = Invoker<ProcessExecutor, TokioSleeper>;

#[derive(Debug, Clone)]
pub struct Invoker<E, S> {
    executor: E,
    sleeper: S,
    classifier: TransientClassifier,
    policy: RetryPolicy,
}

impl SystemInvoker {
    /// Real processes, default phrases and default retry policy.
    pub fn system() -> Self {
        Invoker::new(ProcessExecutor, TokioSleeper)
    }
}

impl<E: Executor, S: Sleeper> Invoker<E, S> {
    pub fn new(executor: E, sleeper: S) -> Self {
        Self {
            executor,
            sleeper,
            classifier: TransientClassifier::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_classifier(mut self, classifier: TransientClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &TransientClassifier {
        &self.classifier
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs `spec` until success, a permanent failure, an interruption of
    /// `ctx`, or the attempt budget is spent.
    ///
    /// Returns the combined output text of the successful attempt.
    pub async fn invoke(&self, ctx: &CallContext, spec: &CommandSpec) -> Result<String, ControlError> {
        let max_attempts = self.policy.attempts();
        let mut backoff = self.policy.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(label = %spec.label, attempt, max_attempts, "Invoking command");

            let outcome = self.executor.execute(ctx, spec).await;
            match self.classifier.classify(ctx, &outcome) {
                RetryOutcome::Success(output) => {
                    debug!(label = %spec.label, attempt, "Command succeeded");
                    return Ok(output);
                }
                RetryOutcome::Interrupted(err) => {
                    debug!(label = %spec.label, attempt, reason = %err, "Command interrupted");
                    return Err(ControlError::Interrupted(err));
                }
                RetryOutcome::PermanentFailure { output, cause } => {
                    debug!(label = %spec.label, attempt, %cause, "Permanent failure, not retrying");
                    return Err(ControlError::PermanentExecution {
                        label: spec.label.clone(),
                        output: output.trim().to_string(),
                        cause,
                    });
                }
                RetryOutcome::TransientFailure { output, cause } => {
                    if attempt >= max_attempts {
                        warn!(label = %spec.label, attempts = attempt, "Transient failure, giving up");
                        return Err(ControlError::TransientExhausted {
                            label: spec.label.clone(),
                            attempts: attempt,
                            output: output.trim().to_string(),
                            cause,
                        });
                    }

                    let delay = backoff.next_delay();
                    warn!(
                        label = %spec.label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    self.sleeper
                        .sleep(ctx, delay)
                        .await
                        .map_err(ControlError::Interrupted)?;
                }
            }
        }
    }
}
