use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The kind of interval the timer is counting down.
///
/// Durations are not part of the variant; they are looked up in the
/// preferences every time the timer is reset. [`TimerMode::default_minutes`]
/// is only the fallback for a missing or invalid preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerMode {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Pomodoro",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    /// Name persisted in the session table.
    pub fn storage_name(self) -> &'static str {
        match self {
            TimerMode::Work => "WORK",
            TimerMode::ShortBreak => "SHORT_BREAK",
            TimerMode::LongBreak => "LONG_BREAK",
        }
    }

    /// Short name accepted on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short",
            TimerMode::LongBreak => "long",
        }
    }

    pub fn default_minutes(self) -> u64 {
        match self {
            TimerMode::Work => 25,
            TimerMode::ShortBreak => 5,
            TimerMode::LongBreak => 15,
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    /// Accepts the short name, the storage name, or common aliases,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "work" | "pomodoro" | "focus" => Ok(TimerMode::Work),
            "short" | "short_break" => Ok(TimerMode::ShortBreak),
            "long" | "long_break" => Ok(TimerMode::LongBreak),
            _ => Err(ValidationError::UnknownMode(s.to_string())),
        }
    }
}
