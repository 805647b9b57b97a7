//! Sleep collaborator used between retry attempts.

use std::time::Duration;

use async_trait::async_trait;

use super::context::{CallContext, ContextError};

/// Waits for `duration`, returning early with the context error if the
/// context fires first.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, ctx: &CallContext, duration: Duration) -> Result<(), ContextError>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, ctx: &CallContext, duration: Duration) -> Result<(), ContextError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
