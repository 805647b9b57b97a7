//! Test doubles for the invoker collaborators.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use amrcontrol::invoker::{
    CallContext, CommandSpec, ContextError, ExecFailure, ExecOutcome, Executor, Sleeper,
};

pub const TIMED_OUT: &str =
    "execution error: Music got an error: AppleEvent timed out. (-1712)";
pub const SYNTAX_ERROR: &str = "syntax error: Expected end of line but found identifier. (-2741)";

pub fn transient() -> ExecOutcome {
    ExecOutcome::failure(TIMED_OUT, ExecFailure::Exit(Some(1)))
}

pub fn permanent() -> ExecOutcome {
    ExecOutcome::failure(SYNTAX_ERROR, ExecFailure::Exit(Some(1)))
}

pub fn ok(output: &str) -> ExecOutcome {
    ExecOutcome::success(output)
}

/// Replays queued outcomes; the last one repeats once the queue is drained.
///
/// Like a real executor, it reports a fired context instead of running.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    outcomes: Arc<Mutex<VecDeque<ExecOutcome>>>,
    calls: Arc<AtomicUsize>,
    labels: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<ExecOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, ctx: &CallContext, spec: &CommandSpec) -> ExecOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.labels.lock().unwrap().push(spec.label.clone());
        if let Some(err) = ctx.err() {
            return ExecOutcome::failure(Vec::new(), ExecFailure::Context(err));
        }

        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap()
        } else {
            outcomes.front().cloned().unwrap_or_default()
        }
    }
}

/// Answers by command label, recording every script it receives.
#[derive(Clone, Default)]
pub struct FakeMusic {
    responses: Arc<Mutex<HashMap<String, ExecOutcome>>>,
    received: Arc<Mutex<Vec<CommandSpec>>>,
}

impl FakeMusic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, label: &str, outcome: ExecOutcome) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(label.to_string(), outcome);
        self
    }

    pub fn received(&self) -> Vec<CommandSpec> {
        self.received.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.received().into_iter().map(|s| s.label).collect()
    }

    /// Script text of the last command with `label`.
    pub fn script(&self, label: &str) -> Option<String> {
        self.received()
            .into_iter()
            .rev()
            .find(|s| s.label == label)
            .map(|s| s.args[1].clone())
    }
}

#[async_trait]
impl Executor for FakeMusic {
    async fn execute(&self, ctx: &CallContext, spec: &CommandSpec) -> ExecOutcome {
        self.received.lock().unwrap().push(spec.clone());
        if let Some(err) = ctx.err() {
            return ExecOutcome::failure(Vec::new(), ExecFailure::Context(err));
        }
        self.responses
            .lock()
            .unwrap()
            .get(&spec.label)
            .cloned()
            .unwrap_or_else(|| ExecOutcome::success(""))
    }
}

/// Records requested delays without waiting.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, ctx: &CallContext, duration: Duration) -> Result<(), ContextError> {
        self.delays.lock().unwrap().push(duration);
        match ctx.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
