//! Argument surface of the `AMRemote` binary.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use amrcontrol::RepeatMode;

/// Remote control for the Music application and its AirPlay outputs
#[derive(Parser, Debug)]
#[command(name = "amremote", version)]
#[command(about = "Remote control for the Music application and its AirPlay outputs")]
pub struct Cli {
    /// Configuration directory (holds config.yaml)
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<String>,

    /// Overall deadline of the command, in seconds (0 disables it)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Toggle between play and pause
    Toggle,
    /// Stop playback
    Stop,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    /// Show or set the volume (0-100)
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: Option<u8>,
    },
    /// Enable or disable shuffle
    Shuffle {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Set the repeat mode
    Repeat {
        #[arg(value_enum)]
        mode: RepeatArg,
    },
    /// Move within the current track (SS, MM:SS or HH:MM:SS)
    Seek { time: String },
    /// Show the player state and current track
    Status,
    /// List playlists, ranked against an optional query
    Playlists {
        #[arg(num_args = 0..)]
        query: Vec<String>,
    },
    /// Play the playlist matching the query
    PlayPlaylist {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// List output devices
    Outputs,
    /// Route audio to exactly the devices matching the queries
    Route {
        #[arg(required = true, num_args = 1..)]
        queries: Vec<String>,
    },
    /// Add the device matching the query to the current outputs
    OutputAdd {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Remove the device matching the query from the current outputs
    OutputRemove {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Check the environment: platform, interpreter, player process
    Doctor,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatArg {
    Off,
    One,
    All,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::One => RepeatMode::One,
            RepeatArg::All => RepeatMode::All,
        }
    }
}

/// Multi-word queries are accepted unquoted: `play-playlist deep focus`.
pub fn join_query(words: &[String]) -> String {
    words.join(" ")
}
