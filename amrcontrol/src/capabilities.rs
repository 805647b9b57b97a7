// amrcontrol/src/capabilities.rs
use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ControlError;
use crate::invoker::CallContext;
use crate::model::{OutputDevice, PlayerStatus, Playlist, RepeatMode};

/// High-level playback state of the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    /// Fast forwarding or rewinding.
    Seeking,
    /// State string the player reported but we do not know.
    Unknown(String),
}

impl PlaybackState {
    /// Map the `player state` text returned by the automation script.
    pub fn from_script_state(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "stopped" => PlaybackState::Stopped,
            "playing" => PlaybackState::Playing,
            "paused" => PlaybackState::Paused,
            "fast forwarding" | "rewinding" => PlaybackState::Seeking,
            _ => PlaybackState::Unknown(raw.trim().to_string()),
        }
    }

    /// Returns a human-readable label for the playback state.
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Seeking => "seeking",
            PlaybackState::Unknown(s) => s.as_str(),
        }
    }

    pub fn has_track(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Seeking
        )
    }
}

/// Abstraction des commandes de transport (lecture / pause / stop / piste).
#[async_trait]
pub trait TransportControl {
    /// Démarre ou reprend la lecture.
    async fn play(&self, ctx: &CallContext) -> Result<(), ControlError>;

    /// Met la lecture en pause.
    async fn pause(&self, ctx: &CallContext) -> Result<(), ControlError>;

    /// Bascule lecture / pause.
    async fn toggle(&self, ctx: &CallContext) -> Result<(), ControlError>;

    /// Arrête la lecture.
    async fn stop(&self, ctx: &CallContext) -> Result<(), ControlError>;

    async fn next_track(&self, ctx: &CallContext) -> Result<(), ControlError>;

    async fn previous_track(&self, ctx: &CallContext) -> Result<(), ControlError>;
}

/// Abstraction du volume et des modes de lecture.
#[async_trait]
pub trait VolumeControl {
    /// Volume courant, de 0 à 100.
    async fn volume(&self, ctx: &CallContext) -> Result<u8, ControlError>;

    /// Définit le volume (0 à 100).
    async fn set_volume(&self, ctx: &CallContext, volume: u8) -> Result<(), ControlError>;

    async fn set_shuffle(&self, ctx: &CallContext, enabled: bool) -> Result<(), ControlError>;

    async fn set_repeat(&self, ctx: &CallContext, mode: RepeatMode) -> Result<(), ControlError>;
}

/// Snapshot of the player state.
#[async_trait]
pub trait PlaybackStatus {
    async fn status(&self, ctx: &CallContext) -> Result<PlayerStatus, ControlError>;
}

/// Candidate-listing collaborator: the universes the resolver searches.
#[async_trait]
pub trait CatalogProvider {
    async fn playlists(&self, ctx: &CallContext) -> Result<Vec<Playlist>, ControlError>;

    async fn output_devices(&self, ctx: &CallContext) -> Result<Vec<OutputDevice>, ControlError>;
}
