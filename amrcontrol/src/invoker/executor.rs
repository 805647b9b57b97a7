//! Execution collaborator: runs one external program, once.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::context::{CallContext, ContextError};

/// Interpréteur par défaut des scripts d'automatisation.
pub const DEFAULT_INTERPRETER: &str = "osascript";

/// An external program invocation, treated as opaque by the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Short human label used in logs and errors ("play", "list playlists", ...).
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(label: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args,
        }
    }

    /// Runs `script` through `osascript -e`.
    pub fn osascript(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self::script(label, DEFAULT_INTERPRETER, script)
    }

    /// Runs `script` through `interpreter -e`.
    pub fn script(
        label: impl Into<String>,
        interpreter: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self::new(label, interpreter, vec!["-e".to_string(), script.into()])
    }
}

/// Generic failure signal of one attempt. Exit codes are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecFailure {
    /// The program ran and reported failure.
    Exit(Option<i32>),
    /// The program could not be started or awaited.
    Spawn(String),
    /// The call context fired while the program was running.
    Context(ContextError),
}

impl fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecFailure::Exit(Some(code)) => write!(f, "exit status {}", code),
            ExecFailure::Exit(None) => write!(f, "terminated by signal"),
            ExecFailure::Spawn(msg) => write!(f, "cannot run command: {}", msg),
            ExecFailure::Context(err) => write!(f, "{}", err),
        }
    }
}

/// Raw result of one attempt: combined output and optional failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub output: Vec<u8>,
    pub failure: Option<ExecFailure>,
}

impl ExecOutcome {
    pub fn success(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
            failure: None,
        }
    }

    pub fn failure(output: impl Into<Vec<u8>>, failure: ExecFailure) -> Self {
        Self {
            output: output.into(),
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Output decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Runs a command once under a call context.
///
/// Implementations must observe `ctx`: when it fires mid-run they return
/// [`ExecFailure::Context`] rather than waiting for the program.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, ctx: &CallContext, spec: &CommandSpec) -> ExecOutcome;
}

/// Spawns a real OS process per attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, ctx: &CallContext, spec: &CommandSpec) -> ExecOutcome {
        if let Some(err) = ctx.err() {
            return ExecOutcome::failure(Vec::new(), ExecFailure::Context(err));
        }

        debug!(label = %spec.label, program = %spec.program, "Spawning command");
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(err) => {
                return ExecOutcome::failure(Vec::new(), ExecFailure::Spawn(err.to_string()));
            }
        };

        // Si le contexte expire, le futur est abandonné et kill_on_drop tue le fils
        let output = tokio::select! {
            output = child.wait_with_output() => output,
            err = ctx.done() => {
                debug!(label = %spec.label, reason = %err, "Command interrupted");
                return ExecOutcome::failure(Vec::new(), ExecFailure::Context(err));
            }
        };

        match output {
            Ok(output) => {
                let mut combined = output.stdout;
                combined.extend_from_slice(&output.stderr);
                trace!(label = %spec.label, status = %output.status, bytes = combined.len(), "Command finished");

                if output.status.success() {
                    ExecOutcome::success(combined)
                } else {
                    ExecOutcome::failure(combined, ExecFailure::Exit(output.status.code()))
                }
            }
            Err(err) => ExecOutcome::failure(Vec::new(), ExecFailure::Spawn(err.to_string())),
        }
    }
}
