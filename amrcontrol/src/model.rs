//! Entities reported by the player and parsing of the script records.
//!
//! Every listing script prints one record per line with TAB-separated fields.
//! Blank lines are ignored; names are kept verbatim (canonicalization happens
//! only when matching).

use serde::Serialize;

use crate::capabilities::PlaybackState;
use crate::errors::ControlError;
use crate::matcher::Candidate;

const FIELD_SEPARATOR: char = '\t';

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Playlist {
    /// Persistent identifier of the playlist.
    pub id: String,
    pub name: String,
    /// Special kind reported by the player ("none" for user playlists).
    pub kind: String,
}

impl Candidate for Playlist {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// An output route (AirPlay device, including the local computer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputDevice {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub selected: bool,
    pub available: bool,
    pub volume: Option<u8>,
}

impl Candidate for OutputDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(RepeatMode::Off),
            "one" => Ok(RepeatMode::One),
            "all" => Ok(RepeatMode::All),
            other => Err(ControlError::parsing("repeat mode", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackInfo {
    pub name: String,
    pub artist: String,
    pub album: String,
    /// Position in seconds.
    pub position: f64,
    /// Duration in seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub volume: u8,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub track: Option<TrackInfo>,
}

fn records(text: &str) -> impl Iterator<Item = Vec<&str>> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(FIELD_SEPARATOR).collect())
}

fn parse_bool(what: &str, raw: &str) -> Result<bool, ControlError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        other => Err(ControlError::parsing(what, format!("expected a boolean, got '{}'", other))),
    }
}

fn parse_volume(raw: &str) -> Result<u8, ControlError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ControlError::parsing("volume", format!("'{}' is not an integer", raw.trim())))?;
    Ok(value.clamp(0, 100) as u8)
}

/// Les réels AppleScript suivent la locale : "12,5" ou "12.5".
fn parse_seconds(what: &str, raw: &str) -> Result<f64, ControlError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "missing value" {
        return Ok(0.0);
    }
    raw.replace(',', ".")
        .parse::<f64>()
        .map(|v| v.max(0.0))
        .map_err(|_| ControlError::parsing(what, format!("'{}' is not a number", raw)))
}

/// Parses `id<TAB>name<TAB>kind` records.
///
/// The name is everything between the first and the last field, so a name
/// containing a TAB survives.
pub fn parse_playlists(text: &str) -> Result<Vec<Playlist>, ControlError> {
    records(text)
        .map(|fields| {
            if fields.len() < 3 {
                return Err(ControlError::parsing(
                    "playlist record",
                    format!("expected 3 fields, got {}", fields.len()),
                ));
            }
            let last = fields.len() - 1;
            Ok(Playlist {
                id: fields[0].trim().to_string(),
                name: fields[1..last].join("\t"),
                kind: fields[last].trim().to_string(),
            })
        })
        .collect()
}

/// Parses `id<TAB>name<TAB>kind<TAB>selected<TAB>available<TAB>volume` records.
pub fn parse_output_devices(text: &str) -> Result<Vec<OutputDevice>, ControlError> {
    records(text)
        .map(|fields| {
            if fields.len() < 6 {
                return Err(ControlError::parsing(
                    "output device record",
                    format!("expected 6 fields, got {}", fields.len()),
                ));
            }
            let n = fields.len();
            let volume = match fields[n - 1].trim() {
                "" | "missing value" => None,
                raw => Some(parse_volume(raw)?),
            };
            Ok(OutputDevice {
                id: fields[0].trim().to_string(),
                name: fields[1..n - 4].join("\t"),
                kind: fields[n - 4].trim().to_string(),
                selected: parse_bool("selected flag", fields[n - 3])?,
                available: parse_bool("available flag", fields[n - 2])?,
                volume,
            })
        })
        .collect()
}

/// Parses the status record.
///
/// The first line holds the fixed fields
/// `state<TAB>volume<TAB>shuffle<TAB>repeat<TAB>position<TAB>duration`;
/// the track name, artist and album follow, one per line, so that they may
/// contain TABs. Track lines are empty (or missing) when the player is
/// stopped.
pub fn parse_status(text: &str) -> Result<PlayerStatus, ControlError> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .skip_while(|line| line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| ControlError::parsing("status", "empty output"))?;
    let fields: Vec<&str> = header.split(FIELD_SEPARATOR).collect();
    if fields.len() != 6 {
        return Err(ControlError::parsing(
            "status",
            format!("expected 6 fields, got {}", fields.len()),
        ));
    }

    let name = lines.next().unwrap_or_default();
    let artist = lines.next().unwrap_or_default();
    let album = lines.next().unwrap_or_default();

    let state = PlaybackState::from_script_state(fields[0]);
    let track = if state.has_track() && !name.is_empty() {
        Some(TrackInfo {
            name: name.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            position: parse_seconds("position", fields[4])?,
            duration: parse_seconds("duration", fields[5])?,
        })
    } else {
        None
    };

    Ok(PlayerStatus {
        state,
        volume: parse_volume(fields[1])?,
        shuffle: parse_bool("shuffle flag", fields[2])?,
        repeat: RepeatMode::parse(fields[3])?,
        track,
    })
}
