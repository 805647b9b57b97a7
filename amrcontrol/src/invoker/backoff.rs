use std::time::Duration;

/// Maximum attempts per logical call (first try included).
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Initial backoff delay after the first transient failure.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff is capped at this value.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(4);

/// After each failure, the delay is multiplied by this factor.
/// Example: 500ms → 1s → 2s → 4s (capped)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Attempt budget of the resilient invoker.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy with a fixed delay between attempts.
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: delay,
            backoff_multiplier: 1.0,
            max_backoff: delay,
        }
    }

    /// Single attempt, no retry.
    pub fn no_retry() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Attempt count actually used: at least one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    pub(crate) fn backoff(&self) -> Backoff {
        Backoff::new(self)
    }
}

/// Delay sequence between attempts; never decreases.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    current: Option<Duration>,
    initial: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    fn new(policy: &RetryPolicy) -> Self {
        let max = policy.max_backoff.max(policy.initial_backoff);
        let multiplier = if policy.backoff_multiplier.is_finite() {
            policy.backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        Self {
            current: None,
            initial: policy.initial_backoff,
            multiplier,
            max,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let next = match self.current {
            Some(current) => {
                let multiplied = current.as_secs_f64() * self.multiplier;
                Duration::from_secs_f64(multiplied.min(self.max.as_secs_f64())).max(current)
            }
            None => self.initial,
        };
        self.current = Some(next);
        next
    }
}
