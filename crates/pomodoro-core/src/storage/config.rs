//! TOML-based user preferences.
//!
//! Stores:
//! - Interval durations per timer mode
//! - Ambient sound toggle and track
//! - Finish tone toggle and track
//!
//! Configuration is stored at `<data_dir>/config.toml`. Every key is
//! optional; a missing key means its default, never an error.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::TimerMode;

/// Durations in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_work")]
    pub work: u64,
    #[serde(default = "default_short_break")]
    pub short_break: u64,
    #[serde(default = "default_long_break")]
    pub long_break: u64,
}

/// Ambient and finish-tone preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default)]
    pub ambient_enabled: bool,
    /// Track id such as `track_03`; `None` means the built-in fallback.
    #[serde(default)]
    pub ambient_track: Option<String>,
    #[serde(default = "default_true")]
    pub finish_tone_enabled: bool,
    #[serde(default)]
    pub finish_tone: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationsConfig,
    #[serde(default)]
    pub sound: SoundConfig,
}

fn default_work() -> u64 {
    TimerMode::Work.default_minutes()
}
fn default_short_break() -> u64 {
    TimerMode::ShortBreak.default_minutes()
}
fn default_long_break() -> u64 {
    TimerMode::LongBreak.default_minutes()
}
fn default_true() -> bool {
    true
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            ambient_enabled: false,
            ambient_track: None,
            finish_tone_enabled: true,
            finish_tone: None,
        }
    }
}

/// Read-only view of the preferences the timer needs.
///
/// Implementations resolve missing values to defaults; lookups never fail.
pub trait Preferences: Send + Sync {
    /// Configured minutes for `mode`, always positive.
    fn duration_minutes(&self, mode: TimerMode) -> u64;

    fn sound(&self) -> SoundConfig;
}

impl Preferences for Config {
    fn duration_minutes(&self, mode: TimerMode) -> u64 {
        let minutes = match mode {
            TimerMode::Work => self.durations.work,
            TimerMode::ShortBreak => self.durations.short_break,
            TimerMode::LongBreak => self.durations.long_break,
        };
        if minutes == 0 {
            tracing::warn!(?mode, "configured duration is zero, using default");
            return mode.default_minutes();
        }
        minutes
    }

    fn sound(&self) -> SoundConfig {
        self.sound.clone()
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as minutes")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    // Optional track ids: empty clears the selection.
                    _ if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Reject values that would break the timer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, minutes) in [
            ("durations.work", self.durations.work),
            ("durations.short_break", self.durations.short_break),
            ("durations.long_break", self.durations.long_break),
        ] {
            if minutes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "duration must be at least one minute".into(),
                });
            }
        }
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from `path`; a missing file yields defaults and writes nothing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key in memory. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Preferences backed by a TOML file that is re-read at every lookup.
///
/// Edits made by another process take effect at the next reset.
///
/// Lookups are plain blocking reads. The service calls them with its lock
/// held (reset, mode change, completion); the file is a few hundred bytes.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file at the default location.
    pub fn open() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Config {
        Config::load_from(&self.path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unreadable preferences, using defaults");
            Config::default()
        })
    }
}

impl Preferences for ConfigFile {
    fn duration_minutes(&self, mode: TimerMode) -> u64 {
        self.read().duration_minutes(mode)
    }

    fn sound(&self) -> SoundConfig {
        self.read().sound
    }
}

/// In-process preferences that can be edited while the timer runs.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn current(&self) -> Config {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, edit: impl FnOnce(&mut Config)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        edit(&mut guard);
    }
}

impl Preferences for SharedConfig {
    fn duration_minutes(&self, mode: TimerMode) -> u64 {
        self.current().duration_minutes(mode)
    }

    fn sound(&self) -> SoundConfig {
        self.current().sound
    }
}
