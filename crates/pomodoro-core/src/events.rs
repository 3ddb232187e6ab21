use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Every state transition of the timer produces an Event.
/// The front-end prints them; the service logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ModeChanged {
        mode: TimerMode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        mode: TimerMode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero on its own.
    TimerCompleted {
        mode: TimerMode,
        started_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
}
