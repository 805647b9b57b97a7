mod cli;
mod commands;
mod logging;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use amrconfig::{Config, get_config};
use amrcontrol::invoker::{
    CallContext, Invoker, ProcessExecutor, RetryPolicy, TokioSleeper, TransientClassifier,
};
use amrcontrol::{ControlError, MusicController, ScriptBuilder, SystemController};

use crate::cli::Cli;
use crate::commands::Printer;

const EXIT_FAILURE: u8 = 1;
const EXIT_AMBIGUOUS: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;
const EXIT_INTERRUPTED: u8 = 130;

fn load_config(directory: Option<&str>) -> Result<Arc<Config>> {
    match directory {
        Some(dir) => Ok(Arc::new(Config::load_config(dir)?)),
        None => Ok(get_config()),
    }
}

/// Builds the controller from the `player` and `invoker` configuration sections.
fn build_controller(config: &Config) -> Result<SystemController> {
    let policy = RetryPolicy {
        max_attempts: config.get_max_attempts()?,
        initial_backoff: Duration::from_millis(config.get_initial_backoff_ms()? as u64),
        backoff_multiplier: config.get_backoff_multiplier(),
        max_backoff: Duration::from_millis(config.get_max_backoff_ms()? as u64),
    };
    let classifier = TransientClassifier::new().with_phrases(config.get_transient_phrases());
    debug!(?policy, phrases = ?classifier.phrases(), "Invoker configured");

    let invoker = Invoker::new(ProcessExecutor, TokioSleeper)
        .with_policy(policy)
        .with_classifier(classifier);
    let scripts = ScriptBuilder::new(config.get_player_application())
        .with_interpreter(config.get_interpreter());

    Ok(MusicController::new(invoker, scripts))
}

/// Call context of the whole command: cancelled by Ctrl-C, bounded by the
/// timeout (`--timeout`, else `invoker.command_timeout_secs`, 0 meaning none).
fn build_context(timeout_secs: u64) -> CallContext {
    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted by user");
            watcher.cancel();
        }
    });

    let ctx = CallContext::with_token(token);
    if timeout_secs == 0 {
        ctx
    } else {
        ctx.with_deadline(tokio::time::Instant::now() + Duration::from_secs(timeout_secs))
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Ambiguous { .. }) => EXIT_AMBIGUOUS,
        Some(ControlError::NotFound { .. }) => EXIT_NOT_FOUND,
        Some(ControlError::Interrupted(_)) => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::TransientExhausted { .. }) => "transient",
        Some(ControlError::PermanentExecution { .. }) => "permanent",
        Some(ControlError::Interrupted(_)) => "interrupted",
        Some(ControlError::Ambiguous { .. }) => "ambiguous",
        Some(ControlError::NotFound { .. }) => "not_found",
        Some(ControlError::ParsingError(_)) => "parsing",
        Some(ControlError::InvalidArgument(_)) => "invalid_argument",
        None => "error",
    }
}

/// Writes the error; ambiguous resolutions list every candidate so the user
/// can refine the query. JSON goes to `out`, text to `err_out`.
fn report(err: &anyhow::Error, as_json: bool, out: &mut dyn Write, err_out: &mut dyn Write) {
    let control = err.downcast_ref::<ControlError>();
    let candidates = match control {
        Some(ControlError::Ambiguous { matches, .. }) => matches.clone(),
        _ => Vec::new(),
    };

    if as_json {
        let value = json!({
            "error": error_kind(err),
            "message": format!("{:#}", err),
            "candidates": candidates
                .iter()
                .map(|(id, name)| json!({ "id": id, "name": name }))
                .collect::<Vec<_>>(),
        });
        let _ = writeln!(out, "{}", value);
        return;
    }

    let _ = writeln!(err_out, "amremote: {:#}", err);
    for (id, name) in &candidates {
        let _ = writeln!(err_out, "  {}  [{}]", name, id);
    }
    if control.is_some_and(ControlError::is_resolution) {
        let _ = writeln!(err_out, "hint: refine the query (see `amremote playlists <query>` or `amremote outputs`)");
    }
}

async fn try_main(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(cli.verbose, &config);

    let controller = build_controller(&config)?;
    let timeout = match cli.timeout {
        Some(secs) => secs,
        None => config.get_command_timeout_secs()? as u64,
    };
    let ctx = build_context(timeout);

    let mut stdout = std::io::stdout().lock();
    let mut printer = Printer::new(&mut stdout, cli.json);
    commands::run(&controller, &ctx, cli.command, &mut printer).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let as_json = cli.json;

    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(
                &err,
                as_json,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            );
            ExitCode::from(exit_code(&err))
        }
    }
}
