//! Dispatch of parsed commands to the controller, and rendering of results.

use std::io::Write;

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use amrcontrol::invoker::{CallContext, Executor, Sleeper};
use amrcontrol::time_utils::{format_position, parse_time_flexible};
use amrcontrol::{
    CatalogProvider, MusicController, OutputDevice, PlaybackStatus, PlayerStatus, Playlist,
    Ranked, RepeatMode, TransportControl, VolumeControl,
};

use crate::cli::{Command, join_query};

/// Where results are written, and how.
pub struct Printer<'w> {
    out: &'w mut dyn Write,
    as_json: bool,
}

impl<'w> Printer<'w> {
    pub fn new(out: &'w mut dyn Write, json: bool) -> Self {
        Self { out, as_json: json }
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        writeln!(self.out, "{}", serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn line(&mut self, text: impl std::fmt::Display) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Acknowledges an action that has no result of its own.
    fn done(&mut self, action: &str) -> Result<()> {
        if self.as_json {
            self.json(&json!({ "ok": true, "action": action }))
        } else {
            Ok(())
        }
    }

    fn status(&mut self, status: &PlayerStatus) -> Result<()> {
        if self.as_json {
            return self.json(status);
        }
        self.line(format!("state:    {}", status.state.as_str()))?;
        self.line(format!("volume:   {}", status.volume))?;
        self.line(format!("shuffle:  {}", on_off(status.shuffle)))?;
        self.line(format!("repeat:   {}", status.repeat.as_str()))?;
        if let Some(track) = &status.track {
            self.line(format!(
                "track:    {} - {} ({})",
                track.name, track.artist, track.album
            ))?;
            self.line(format!(
                "position: {} / {}",
                format_position(track.position),
                format_position(track.duration)
            ))?;
        }
        Ok(())
    }

    fn playlists(&mut self, ranked: &[Ranked<Playlist>]) -> Result<()> {
        if self.as_json {
            return self.json(ranked);
        }
        for entry in ranked {
            self.line(format!("{:<12} {}", entry.tier.as_str(), entry.item.name))?;
        }
        Ok(())
    }

    fn devices(&mut self, devices: &[OutputDevice]) -> Result<()> {
        if self.as_json {
            return self.json(devices);
        }
        for device in devices {
            let marker = if device.selected { '*' } else { ' ' };
            let mut line = format!("{} {} ({})", marker, device.name, device.kind);
            if let Some(volume) = device.volume {
                line.push_str(&format!(" {}%", volume));
            }
            if !device.available {
                line.push_str(" [unavailable]");
            }
            self.line(line)?;
        }
        Ok(())
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// Environment report printed by `doctor`.
#[derive(Debug, Serialize)]
struct DoctorReport {
    os: String,
    macos: bool,
    interpreter: String,
    interpreter_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    interpreter_error: Option<String>,
    application: String,
    application_running: bool,
}

async fn doctor<E: Executor, S: Sleeper>(
    controller: &MusicController<E, S>,
    ctx: &CallContext,
    printer: &mut Printer<'_>,
) -> Result<()> {
    let scripts = controller.scripts();
    let interpreter_error = match controller.invoker().invoke(ctx, &scripts.probe()).await {
        Ok(_) => None,
        Err(err) if err.is_interrupted() => return Err(err.into()),
        Err(err) => Some(err.to_string()),
    };

    let report = DoctorReport {
        os: amrutils::get_os_string(),
        macos: amrutils::is_macos(),
        interpreter: scripts.interpreter().to_string(),
        interpreter_ok: interpreter_error.is_none(),
        interpreter_error,
        application: scripts.application().to_string(),
        application_running: amrutils::is_process_running(scripts.application()),
    };
    debug!(?report, "Environment checked");

    if printer.as_json {
        printer.json(&report)?;
    } else {
        printer.line(format!("os:          {}", report.os))?;
        printer.line(format!(
            "interpreter: {} ({})",
            report.interpreter,
            if report.interpreter_ok { "ok" } else { "FAILED" }
        ))?;
        if let Some(error) = &report.interpreter_error {
            printer.line(format!("             {}", error))?;
        }
        printer.line(format!(
            "application: {} ({})",
            report.application,
            if report.application_running { "running" } else { "not running" }
        ))?;
        if !report.macos {
            printer.line("warning:     the Music application is only scriptable on macOS")?;
        }
    }

    if report.interpreter_ok {
        Ok(())
    } else {
        Err(anyhow!("environment check failed"))
    }
}

/// Runs one command to completion.
pub async fn run<E: Executor, S: Sleeper>(
    controller: &MusicController<E, S>,
    ctx: &CallContext,
    command: Command,
    printer: &mut Printer<'_>,
) -> Result<()> {
    debug!(?command, "Running command");
    match command {
        Command::Play => {
            controller.play(ctx).await?;
            printer.done("play")
        }
        Command::Pause => {
            controller.pause(ctx).await?;
            printer.done("pause")
        }
        Command::Toggle => {
            controller.toggle(ctx).await?;
            printer.done("toggle")
        }
        Command::Stop => {
            controller.stop(ctx).await?;
            printer.done("stop")
        }
        Command::Next => {
            controller.next_track(ctx).await?;
            printer.done("next")
        }
        Command::Prev => {
            controller.previous_track(ctx).await?;
            printer.done("prev")
        }
        Command::Volume { level: None } => {
            let volume = controller.volume(ctx).await?;
            if printer.as_json {
                printer.json(&json!({ "volume": volume }))
            } else {
                printer.line(volume)
            }
        }
        Command::Volume { level: Some(level) } => {
            info!(level, "Setting volume");
            controller.set_volume(ctx, level).await?;
            printer.done("volume")
        }
        Command::Shuffle { state } => {
            controller.set_shuffle(ctx, state.enabled()).await?;
            printer.done("shuffle")
        }
        Command::Repeat { mode } => {
            controller.set_repeat(ctx, RepeatMode::from(mode)).await?;
            printer.done("repeat")
        }
        Command::Seek { time } => {
            let seconds = parse_time_flexible(&time)?;
            controller.seek(ctx, seconds).await?;
            printer.done("seek")
        }
        Command::Status => {
            let status = controller.status(ctx).await?;
            printer.status(&status)
        }
        Command::Playlists { query } => {
            let ranked = controller.find_playlists(ctx, &join_query(&query)).await?;
            printer.playlists(&ranked)
        }
        Command::PlayPlaylist { query } => {
            let playlist = controller.play_playlist(ctx, &join_query(&query)).await?;
            if printer.as_json {
                printer.json(&playlist)
            } else {
                printer.line(format!("Playing {}", playlist.name))
            }
        }
        Command::Outputs => {
            let devices = controller.output_devices(ctx).await?;
            printer.devices(&devices)
        }
        Command::Route { queries } => {
            let selected = controller.route_outputs(ctx, &queries).await?;
            printer.devices(&selected)
        }
        Command::OutputAdd { query } => {
            let selected = controller.add_output(ctx, &join_query(&query)).await?;
            printer.devices(&selected)
        }
        Command::OutputRemove { query } => {
            let selected = controller.remove_output(ctx, &join_query(&query)).await?;
            printer.devices(&selected)
        }
        Command::Doctor => doctor(controller, ctx, printer).await,
    }
}
