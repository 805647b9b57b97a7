//! High-level operations on the Music application.
//!
//! `MusicController` composes the three core pieces: listing scripts feed the
//! candidate universes, the matcher/resolver picks entities from user
//! queries, and every script runs through the resilient [`Invoker`].

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use amrutils::canonicalize;

use crate::capabilities::{CatalogProvider, PlaybackStatus, TransportControl, VolumeControl};
use crate::errors::ControlError;
use crate::invoker::{CallContext, Executor, Invoker, Sleeper, SystemInvoker};
use crate::matcher::{MatchTier, SubsequenceScore, rank};
use crate::model::{
    OutputDevice, PlayerStatus, Playlist, RepeatMode, parse_output_devices, parse_playlists,
    parse_status,
};
use crate::resolver::{resolve, resolve_all};
use crate::script::ScriptBuilder;

const PLAYLIST_KIND: &str = "playlist";
const OUTPUT_KIND: &str = "output device";

/// Owned ranking entry, for display.
#[derive(Clone, Debug, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub tier: MatchTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<SubsequenceScore>,
}

pub type SystemController = MusicController<crate::invoker::ProcessExecutor, crate::invoker::TokioSleeper>;

#[derive(Debug, Clone)]
pub struct MusicController<E, S> {
    invoker: Invoker<E, S>,
    scripts: ScriptBuilder,
}

impl SystemController {
    /// Controller for the default application through real `osascript` runs.
    pub fn system() -> Self {
        MusicController::new(SystemInvoker::system(), ScriptBuilder::default())
    }
}

fn require_query(kind: &str, query: &str) -> Result<(), ControlError> {
    if canonicalize(query).is_empty() {
        return Err(ControlError::InvalidArgument(format!(
            "an empty {} name matches everything",
            kind
        )));
    }
    Ok(())
}

impl<E: Executor, S: Sleeper> MusicController<E, S> {
    pub fn new(invoker: Invoker<E, S>, scripts: ScriptBuilder) -> Self {
        Self { invoker, scripts }
    }

    pub fn invoker(&self) -> &Invoker<E, S> {
        &self.invoker
    }

    pub fn scripts(&self) -> &ScriptBuilder {
        &self.scripts
    }

    async fn run(&self, ctx: &CallContext, spec: crate::invoker::CommandSpec) -> Result<String, ControlError> {
        self.invoker.invoke(ctx, &spec).await
    }

    /// Playlists ranked against `query`, best first.
    ///
    /// An empty query lists every playlist.
    pub async fn find_playlists(
        &self,
        ctx: &CallContext,
        query: &str,
    ) -> Result<Vec<Ranked<Playlist>>, ControlError> {
        let playlists = self.playlists(ctx).await?;
        let ranked = rank(query, &playlists)
            .into_iter()
            .map(|r| Ranked {
                item: r.candidate.clone(),
                tier: r.tier,
                score: r.score,
            })
            .collect::<Vec<_>>();
        debug!(query, total = playlists.len(), matched = ranked.len(), "Ranked playlists");
        Ok(ranked)
    }

    /// Resolves `query` to exactly one playlist and starts it.
    pub async fn play_playlist(&self, ctx: &CallContext, query: &str) -> Result<Playlist, ControlError> {
        require_query(PLAYLIST_KIND, query)?;
        let playlists = self.playlists(ctx).await?;
        let playlist = resolve(PLAYLIST_KIND, query, &playlists)?.clone();

        info!(query, id = %playlist.id, name = %playlist.name, "Playing playlist");
        self.run(ctx, self.scripts.play_playlist(&playlist.id)).await?;
        Ok(playlist)
    }

    /// Routes audio to exactly the devices matching `queries`.
    ///
    /// Every query must resolve to one device; nothing is changed otherwise.
    /// Returns the selected devices.
    pub async fn route_outputs<Q: AsRef<str> + Sync>(
        &self,
        ctx: &CallContext,
        queries: &[Q],
    ) -> Result<Vec<OutputDevice>, ControlError> {
        if queries.is_empty() {
            return Err(ControlError::InvalidArgument(
                "at least one output device is required".to_string(),
            ));
        }
        for query in queries {
            require_query(OUTPUT_KIND, query.as_ref())?;
        }

        let devices = self.output_devices(ctx).await?;
        let selected: Vec<OutputDevice> = resolve_all(OUTPUT_KIND, queries, &devices)?
            .into_iter()
            .cloned()
            .collect();
        self.select_outputs(ctx, &selected).await?;
        Ok(selected)
    }

    /// Adds the device matching `query` to the current outputs.
    pub async fn add_output(&self, ctx: &CallContext, query: &str) -> Result<Vec<OutputDevice>, ControlError> {
        require_query(OUTPUT_KIND, query)?;
        let devices = self.output_devices(ctx).await?;
        let target = resolve(OUTPUT_KIND, query, &devices)?;

        let mut selected: Vec<OutputDevice> = devices.iter().filter(|d| d.selected).cloned().collect();
        if !selected.iter().any(|d| d.id == target.id) {
            selected.push(target.clone());
        }
        self.select_outputs(ctx, &selected).await?;
        Ok(selected)
    }

    /// Removes the device matching `query` from the current outputs.
    ///
    /// At least one output must remain selected.
    pub async fn remove_output(&self, ctx: &CallContext, query: &str) -> Result<Vec<OutputDevice>, ControlError> {
        require_query(OUTPUT_KIND, query)?;
        let devices = self.output_devices(ctx).await?;
        let target = resolve(OUTPUT_KIND, query, &devices)?;
        if !target.selected {
            return Err(ControlError::InvalidArgument(format!(
                "'{}' is not a selected output device",
                target.name
            )));
        }

        let selected: Vec<OutputDevice> = devices
            .iter()
            .filter(|d| d.selected && d.id != target.id)
            .cloned()
            .collect();
        if selected.is_empty() {
            return Err(ControlError::InvalidArgument(format!(
                "'{}' is the only selected output device",
                target.name
            )));
        }
        self.select_outputs(ctx, &selected).await?;
        Ok(selected)
    }

    async fn select_outputs(&self, ctx: &CallContext, devices: &[OutputDevice]) -> Result<(), ControlError> {
        let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
        info!(devices = ?devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), "Routing audio");
        self.run(ctx, self.scripts.set_output_devices(&ids)).await?;
        Ok(())
    }

    /// Moves the playback position, in seconds from the track start.
    pub async fn seek(&self, ctx: &CallContext, seconds: u32) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.seek(seconds)).await.map(|_| ())
    }
}

#[async_trait]
impl<E: Executor, S: Sleeper> TransportControl for MusicController<E, S> {
    async fn play(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.play()).await.map(|_| ())
    }

    async fn pause(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.pause()).await.map(|_| ())
    }

    async fn toggle(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.playpause()).await.map(|_| ())
    }

    async fn stop(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.stop()).await.map(|_| ())
    }

    async fn next_track(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.next_track()).await.map(|_| ())
    }

    async fn previous_track(&self, ctx: &CallContext) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.previous_track()).await.map(|_| ())
    }
}

#[async_trait]
impl<E: Executor, S: Sleeper> VolumeControl for MusicController<E, S> {
    async fn volume(&self, ctx: &CallContext) -> Result<u8, ControlError> {
        let output = self.run(ctx, self.scripts.get_volume()).await?;
        let value = output
            .trim()
            .parse::<i64>()
            .map_err(|_| ControlError::parsing("volume", format!("'{}' is not an integer", output.trim())))?;
        Ok(value.clamp(0, 100) as u8)
    }

    async fn set_volume(&self, ctx: &CallContext, volume: u8) -> Result<(), ControlError> {
        if volume > 100 {
            return Err(ControlError::InvalidArgument(format!(
                "volume must be between 0 and 100, got {}",
                volume
            )));
        }
        self.run(ctx, self.scripts.set_volume(volume)).await.map(|_| ())
    }

    async fn set_shuffle(&self, ctx: &CallContext, enabled: bool) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.set_shuffle(enabled)).await.map(|_| ())
    }

    async fn set_repeat(&self, ctx: &CallContext, mode: RepeatMode) -> Result<(), ControlError> {
        self.run(ctx, self.scripts.set_repeat(mode)).await.map(|_| ())
    }
}

#[async_trait]
impl<E: Executor, S: Sleeper> PlaybackStatus for MusicController<E, S> {
    async fn status(&self, ctx: &CallContext) -> Result<PlayerStatus, ControlError> {
        let output = self.run(ctx, self.scripts.status()).await?;
        parse_status(&output)
    }
}

#[async_trait]
impl<E: Executor, S: Sleeper> CatalogProvider for MusicController<E, S> {
    async fn playlists(&self, ctx: &CallContext) -> Result<Vec<Playlist>, ControlError> {
        let output = self.run(ctx, self.scripts.list_playlists()).await?;
        parse_playlists(&output)
    }

    async fn output_devices(&self, ctx: &CallContext) -> Result<Vec<OutputDevice>, ControlError> {
        let output = self.run(ctx, self.scripts.list_output_devices()).await?;
        parse_output_devices(&output)
    }
}
