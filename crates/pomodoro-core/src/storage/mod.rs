mod config;
pub mod database;
pub mod session_store;

pub use config::{Config, ConfigFile, DurationsConfig, Preferences, SharedConfig, SoundConfig};
pub use database::{Database, NewSession, SessionRecord, Stats};
pub use session_store::{LiveSessions, SessionLog, SessionStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml`, `pomodoro.db` and `sounds/`.
///
/// `POMODORO_DATA_DIR` wins when set. Otherwise `~/.config/pomodoro[-dev]/`
/// based on POMODORO_ENV (set POMODORO_ENV=dev for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMODORO_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMODORO_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomodoro-dev")
            } else {
                base_dir.join("pomodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Directory scanned for ambient and finish-tone tracks.
pub fn sounds_dir() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("sounds"))
}
