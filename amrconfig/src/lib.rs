//! # AMRemote Configuration Module
//!
//! This module provides configuration management for AMRemote, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use amrconfig::get_config;
//!
//! let config = get_config();
//!
//! let attempts = config.get_max_attempts()?;
//! let app = config.get_player_application();
//!
//! config.set_max_attempts(5)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("amremote.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(
        Config::load_config("").unwrap_or_else(|err| {
            warn!(error=%err, "Failed to load AMRemote configuration, using embedded defaults");
            Config::embedded()
        })
    );
}

const ENV_CONFIG_DIR: &str = "AMREMOTE_CONFIG";
const ENV_PREFIX: &str = "AMREMOTE_CONFIG__";
const CONFIG_DIR_NAME: &str = ".amremote";

// Default values for configuration
const DEFAULT_PLAYER_APPLICATION: &str = "Music";
const DEFAULT_INTERPRETER: &str = "osascript";
const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_INITIAL_BACKOFF_MS: usize = 500;
const DEFAULT_MAX_BACKOFF_MS: usize = 4000;
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
const DEFAULT_COMMAND_TIMEOUT_SECS: usize = 15;
const DEFAULT_LOG_MIN_LEVEL: &str = "WARN";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => Ok(n.as_u64().map_or($default, |v| v as usize)),
                Ok(Value::Number(n)) if n.is_i64() => Ok(n.as_i64().map_or($default, |v| v.max(0) as usize)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            let n = Number::from(value as u64);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration manager for AMRemote
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
///
/// A `Config` built by [`Config::embedded`] has no backing file: setters
/// update the in-memory tree only.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: Option<String>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            return home.join(CONFIG_DIR_NAME).to_string_lossy().to_string();
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `AMREMOTE_CONFIG` environment variable
    /// 3. `.amremote` in the current directory
    /// 4. `.amremote` in the user's home directory
    ///
    /// The directory is created if it doesn't exist.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut default_value, &external_value);
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = lower_keys_value(default_value);
        apply_env_overrides(&mut config_value, env::vars());

        let config = Config {
            config_dir,
            path: Some(path),
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Builds a configuration from the embedded defaults only, without any
    /// file or environment lookup.
    pub fn embedded() -> Self {
        let value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap_or(Value::Mapping(Mapping::new()));
        Config {
            config_dir: String::new(),
            path: None,
            data: Mutex::new(lower_keys_value(value)),
        }
    }

    /// Returns the directory holding `config.yaml` (empty for embedded configs)
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        // Un panic pendant une écriture ne laisse jamais l'arbre à moitié modifié
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&*self.lock())?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["invoker", "max_attempts"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock();
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock();
        get_value_internal(&data, path)
    }

    impl_string_config!(
        get_player_application,
        set_player_application,
        &["player", "application"],
        DEFAULT_PLAYER_APPLICATION
    );

    impl_string_config!(
        get_interpreter,
        set_interpreter,
        &["invoker", "interpreter"],
        DEFAULT_INTERPRETER
    );

    impl_usize_config!(
        get_max_attempts,
        set_max_attempts,
        &["invoker", "max_attempts"],
        DEFAULT_MAX_ATTEMPTS
    );

    impl_usize_config!(
        get_initial_backoff_ms,
        set_initial_backoff_ms,
        &["invoker", "initial_backoff_ms"],
        DEFAULT_INITIAL_BACKOFF_MS
    );

    impl_usize_config!(
        get_max_backoff_ms,
        set_max_backoff_ms,
        &["invoker", "max_backoff_ms"],
        DEFAULT_MAX_BACKOFF_MS
    );

    impl_usize_config!(
        get_command_timeout_secs,
        set_command_timeout_secs,
        &["invoker", "command_timeout_secs"],
        DEFAULT_COMMAND_TIMEOUT_SECS
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    /// Gets the backoff multiplier applied between retries
    ///
    /// Values below 1.0 would shrink the delay; they are clamped to 1.0.
    pub fn get_backoff_multiplier(&self) -> f64 {
        let raw = match self.get_value(&["invoker", "backoff_multiplier"]) {
            Ok(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_BACKOFF_MULTIPLIER),
            Ok(Value::String(s)) => s.parse::<f64>().unwrap_or_else(|_| {
                warn!(
                    "Invalid backoff multiplier '{}', using default {}",
                    s, DEFAULT_BACKOFF_MULTIPLIER
                );
                DEFAULT_BACKOFF_MULTIPLIER
            }),
            _ => DEFAULT_BACKOFF_MULTIPLIER,
        };
        if raw.is_finite() { raw.max(1.0) } else { DEFAULT_BACKOFF_MULTIPLIER }
    }

    /// Sets the backoff multiplier
    pub fn set_backoff_multiplier(&self, multiplier: f64) -> Result<()> {
        self.set_value(
            &["invoker", "backoff_multiplier"],
            Value::Number(Number::from(multiplier)),
        )
    }

    /// Gets the extra transient-indicator phrases
    ///
    /// These phrases extend the built-in list used to decide whether a failed
    /// script run deserves a retry. Non-string entries are ignored.
    pub fn get_transient_phrases(&self) -> Vec<String> {
        match self.get_value(&["invoker", "transient_phrases"]) {
            Ok(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            Ok(Value::String(s)) if !s.trim().is_empty() => vec![s],
            _ => Vec::new(),
        }
    }

    /// Replaces the extra transient-indicator phrases
    pub fn set_transient_phrases(&self, phrases: Vec<String>) -> Result<()> {
        let seq = phrases.into_iter().map(Value::String).collect();
        self.set_value(&["invoker", "transient_phrases"], Value::Sequence(seq))
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access. When the configuration
/// directory cannot be prepared, the embedded defaults are used instead.
///
/// # Examples
///
/// ```no_run
/// use amrconfig::get_config;
///
/// let config = get_config();
/// let app = config.get_player_application();
/// ```
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(&Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

/// Applies `AMREMOTE_CONFIG__SECTION__KEY=value` overrides
fn apply_env_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            let yaml_value = convert_env_value(&value);
            if let Err(err) = set_value_internal(config, &key_path, yaml_value) {
                warn!(env_var=%key, error=%err, "Ignoring config override");
            }
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = Config::embedded();
        assert_eq!(config.get_player_application(), "Music");
        assert_eq!(config.get_interpreter(), "osascript");
        assert_eq!(config.get_max_attempts().unwrap(), 3);
        assert_eq!(config.get_initial_backoff_ms().unwrap(), 500);
        assert_eq!(config.get_max_backoff_ms().unwrap(), 4000);
        assert_eq!(config.get_command_timeout_secs().unwrap(), 15);
        assert_eq!(config.get_backoff_multiplier(), 2.0);
        assert!(config.get_transient_phrases().is_empty());
        assert_eq!(config.get_log_min_level(), "WARN");
        assert!(config.get_log_enable_console().unwrap());
    }

    #[test]
    fn test_merge_yaml_keeps_unrelated_defaults() {
        let mut base = yaml("invoker:\n  max_attempts: 3\n  interpreter: osascript\n");
        let external = yaml("invoker:\n  max_attempts: 5\n");
        merge_yaml(&mut base, &external);

        assert_eq!(
            get_value_internal(&base, &["invoker", "max_attempts"]).unwrap(),
            yaml("5")
        );
        assert_eq!(
            get_value_internal(&base, &["invoker", "interpreter"]).unwrap(),
            yaml("osascript")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut value = lower_keys_value(yaml(DEFAULT_CONFIG));
        let vars = vec![
            ("AMREMOTE_CONFIG__INVOKER__MAX_ATTEMPTS".to_string(), "7".to_string()),
            ("AMREMOTE_CONFIG__PLAYER__APPLICATION".to_string(), "iTunes".to_string()),
            ("UNRELATED".to_string(), "1".to_string()),
        ];
        apply_env_overrides(&mut value, vars);

        assert_eq!(
            get_value_internal(&value, &["invoker", "max_attempts"]).unwrap(),
            yaml("7")
        );
        assert_eq!(
            get_value_internal(&value, &["player", "application"]).unwrap(),
            Value::String("iTunes".to_string())
        );
        assert!(get_value_internal(&value, &["unrelated"]).is_err());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let value = lower_keys_value(yaml("Player:\n  Application: Music\n"));
        assert_eq!(
            get_value_internal(&value, &["PLAYER", "application"]).unwrap(),
            Value::String("Music".to_string())
        );
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let config = Config::embedded();
        let err = config.get_value(&["nope", "missing"]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_setters_on_embedded_config() {
        let config = Config::embedded();
        config.set_max_attempts(4).unwrap();
        config.set_backoff_multiplier(0.5).unwrap();
        config
            .set_transient_phrases(vec!["server busy".to_string(), "  ".to_string()])
            .unwrap();

        assert_eq!(config.get_max_attempts().unwrap(), 4);
        // Un multiplicateur < 1 ferait décroître le délai
        assert_eq!(config.get_backoff_multiplier(), 1.0);
        assert_eq!(config.get_transient_phrases(), vec!["server busy".to_string()]);
    }

    #[test]
    fn test_load_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "player:\n  application: iTunes\ninvoker:\n  transient_phrases:\n    - \"Server busy\"\n",
        )
        .unwrap();

        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_player_application(), "iTunes");
        assert_eq!(config.get_transient_phrases(), vec!["Server busy".to_string()]);
        // Les valeurs absentes du fichier viennent des défauts intégrés
        assert_eq!(config.get_max_attempts().unwrap(), 3);

        // Le fichier fusionné est réécrit
        config.set_command_timeout_secs(30).unwrap();
        let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(saved.contains("command_timeout_secs: 30"));
        assert!(saved.contains("max_attempts: 3"));
    }

    #[test]
    fn test_load_config_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("amremote");
        let config = Config::load_config(nested.to_str().unwrap()).unwrap();

        assert!(nested.join("config.yaml").exists());
        assert_eq!(config.directory(), nested.to_str().unwrap());
    }
}
