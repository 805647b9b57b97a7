pub mod capabilities;
pub mod controller;
pub mod errors;
pub mod invoker;
pub mod matcher;
pub mod model;
pub mod resolver;
pub mod script;
pub mod time_utils;

pub use capabilities::{
    CatalogProvider, PlaybackState, PlaybackStatus, TransportControl, VolumeControl,
};
pub use controller::{MusicController, Ranked, SystemController};
pub use errors::ControlError;
pub use invoker::{
    CallContext, CommandSpec, ContextError, ExecFailure, ExecOutcome, Executor, Invoker,
    ProcessExecutor, RetryPolicy, Sleeper, SystemInvoker, TokioSleeper, TransientClassifier,
};
pub use matcher::{Candidate, MatchResult, MatchTier, NamedItem, pick_best, rank};
pub use model::{OutputDevice, PlayerStatus, Playlist, RepeatMode, TrackInfo};
pub use resolver::{resolve, resolve_all};
pub use script::ScriptBuilder;
