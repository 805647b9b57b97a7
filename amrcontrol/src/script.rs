//! AppleScript templates for the Music application.
//!
//! Scripts are plain text handed to the interpreter; the invoker treats them
//! as opaque. Listing scripts print one record per line with TAB-separated
//! fields, in the layout expected by [`crate::model`].

use crate::invoker::{CommandSpec, DEFAULT_INTERPRETER};
use crate::model::RepeatMode;

/// Application pilotée par défaut.
pub const DEFAULT_APPLICATION: &str = "Music";

/// Quotes `value` as an AppleScript string literal.
///
/// # Examples
/// ```
/// # use amrcontrol::script::quote;
/// assert_eq!(quote(r#"Say "hi""#), r#""Say \"hi\"""#);
/// ```
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Builds the command specs sent to the scripting interpreter.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    application: String,
    interpreter: String,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_APPLICATION)
    }
}

impl ScriptBuilder {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Trivial script used to check that the interpreter runs at all.
    pub fn probe(&self) -> CommandSpec {
        self.spec("probe", "return \"ok\"".to_string())
    }

    fn spec(&self, label: &str, script: String) -> CommandSpec {
        CommandSpec::script(label, self.interpreter.as_str(), script)
    }

    /// `tell application "X" to <statement>`
    fn tell(&self, label: &str, statement: &str) -> CommandSpec {
        self.spec(
            label,
            format!("tell application {} to {}", quote(&self.application), statement),
        )
    }

    /// Multi-line `tell` block.
    fn tell_block(&self, label: &str, body: &str) -> CommandSpec {
        self.spec(
            label,
            format!(
                "tell application {}\n{}\nend tell",
                quote(&self.application),
                body.trim_end()
            ),
        )
    }

    pub fn play(&self) -> CommandSpec {
        self.tell("play", "play")
    }

    pub fn pause(&self) -> CommandSpec {
        self.tell("pause", "pause")
    }

    pub fn playpause(&self) -> CommandSpec {
        self.tell("toggle", "playpause")
    }

    pub fn stop(&self) -> CommandSpec {
        self.tell("stop", "stop")
    }

    pub fn next_track(&self) -> CommandSpec {
        self.tell("next track", "next track")
    }

    pub fn previous_track(&self) -> CommandSpec {
        self.tell("previous track", "previous track")
    }

    pub fn get_volume(&self) -> CommandSpec {
        self.tell("get volume", "get sound volume")
    }

    /// Volume values above 100 are clamped.
    pub fn set_volume(&self, volume: u8) -> CommandSpec {
        self.tell(
            "set volume",
            &format!("set sound volume to {}", volume.min(100)),
        )
    }

    pub fn set_shuffle(&self, enabled: bool) -> CommandSpec {
        self.tell(
            "set shuffle",
            &format!("set shuffle enabled to {}", enabled),
        )
    }

    pub fn set_repeat(&self, mode: RepeatMode) -> CommandSpec {
        self.tell("set repeat", &format!("set song repeat to {}", mode.as_str()))
    }

    pub fn seek(&self, seconds: u32) -> CommandSpec {
        self.tell("seek", &format!("set player position to {}", seconds))
    }

    /// Lists user playlists as `id<TAB>name<TAB>kind`.
    pub fn list_playlists(&self) -> CommandSpec {
        self.tell_block(
            "list playlists",
            r#"	set out to ""
	repeat with p in (every user playlist)
		set out to out & (persistent ID of p) & tab & (name of p) & tab & ((special kind of p) as text) & linefeed
	end repeat
	return out"#,
        )
    }

    /// Starts playing the playlist with the given persistent id.
    pub fn play_playlist(&self, playlist_id: &str) -> CommandSpec {
        self.tell(
            "play playlist",
            &format!(
                "play (first playlist whose persistent ID is {})",
                quote(playlist_id)
            ),
        )
    }

    /// Lists AirPlay devices as
    /// `id<TAB>name<TAB>kind<TAB>selected<TAB>available<TAB>volume`.
    pub fn list_output_devices(&self) -> CommandSpec {
        self.tell_block(
            "list output devices",
            r#"	set out to ""
	repeat with d in (every AirPlay device)
		set vol to "missing value"
		try
			set vol to (sound volume of d) as text
		end try
		set out to out & (persistent ID of d) & tab & (name of d) & tab & ((kind of d) as text) & tab & ((selected of d) as text) & tab & ((available of d) as text) & tab & vol & linefeed
	end repeat
	return out"#,
        )
    }

    /// Routes audio to exactly the devices with the given persistent ids.
    pub fn set_output_devices<S: AsRef<str>>(&self, device_ids: &[S]) -> CommandSpec {
        let devices = device_ids
            .iter()
            .map(|id| format!("(first AirPlay device whose persistent ID is {})", quote(id.as_ref())))
            .collect::<Vec<_>>()
            .join(", ");
        self.tell(
            "set output devices",
            &format!("set current AirPlay devices to {{{}}}", devices),
        )
    }

    /// Status record: a TAB-separated header line, then the track name,
    /// artist and album on their own lines. See [`crate::model::parse_status`].
    pub fn status(&self) -> CommandSpec {
        self.tell_block(
            "status",
            r#"	set st to (player state as text)
	set vol to (sound volume as text)
	set shuf to (shuffle enabled as text)
	set rep to (song repeat as text)
	set tn to ""
	set ta to ""
	set tb to ""
	set pos to ""
	set dur to ""
	if player state is not stopped then
		try
			set tn to name of current track
			set ta to artist of current track
			set tb to album of current track
			set dur to (duration of current track) as text
			set pos to (player position) as text
		end try
	end if
	return st & tab & vol & tab & shuf & tab & rep & tab & pos & tab & dur & linefeed & tn & linefeed & ta & linefeed & tb"#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_of(spec: &CommandSpec) -> &str {
        assert_eq!(spec.args[0], "-e");
        &spec.args[1]
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("Chill"), "\"Chill\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote("\"x\""), "\"\\\"x\\\"\"");
    }

    #[test]
    fn test_simple_commands() {
        let builder = ScriptBuilder::default();
        assert_eq!(script_of(&builder.play()), "tell application \"Music\" to play");
        assert_eq!(builder.playpause().label, "toggle");
        assert_eq!(builder.play().program, "osascript");
        assert_eq!(script_of(&builder.probe()), "return \"ok\"");
    }

    #[test]
    fn test_custom_application_and_interpreter() {
        let builder = ScriptBuilder::new("iTunes").with_interpreter("/usr/bin/osascript");
        let spec = builder.next_track();
        assert_eq!(spec.program, "/usr/bin/osascript");
        assert_eq!(script_of(&spec), "tell application \"iTunes\" to next track");
    }

    #[test]
    fn test_set_volume_is_clamped() {
        let builder = ScriptBuilder::default();
        assert!(script_of(&builder.set_volume(250)).ends_with("set sound volume to 100"));
        assert!(script_of(&builder.set_volume(35)).ends_with("set sound volume to 35"));
    }

    #[test]
    fn test_play_playlist_quotes_id() {
        let builder = ScriptBuilder::default();
        let script = script_of(&builder.play_playlist("AB\"CD")).to_string();
        assert!(script.contains("persistent ID is \"AB\\\"CD\""));
    }

    #[test]
    fn test_set_output_devices() {
        let builder = ScriptBuilder::default();
        let script = script_of(&builder.set_output_devices(&["A1", "B2"])).to_string();
        assert!(script.contains("set current AirPlay devices to {(first AirPlay device whose persistent ID is \"A1\"), (first AirPlay device whose persistent ID is \"B2\")}"));
    }

    #[test]
    fn test_block_scripts() {
        let builder = ScriptBuilder::default();
        let script = script_of(&builder.list_playlists()).to_string();
        assert!(script.starts_with("tell application \"Music\"\n"));
        assert!(script.ends_with("end tell"));
        assert!(script.contains("every user playlist"));

        assert!(script_of(&builder.status()).contains("player state"));
        assert!(script_of(&builder.list_output_devices()).contains("every AirPlay device"));
    }
}
