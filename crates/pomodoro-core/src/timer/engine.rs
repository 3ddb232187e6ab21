//! Countdown state machine.
//!
//! The engine is pure: it owns no task and reads no clock or preferences.
//! Callers pass in the current instant and the configured duration, and
//! call `tick()` once per elapsed second while the engine is running.
//! [`crate::timer::TimerService`] is the async owner that does this.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start_or_toggle--> Running --start_or_toggle--> Idle (paused)
//! Running --tick reaches 0--> Idle (completed)
//! any --reset / change_mode--> Idle (full duration)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mode::TimerMode;
use crate::events::Event;

/// Point-in-time view of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub seconds_remaining: u64,
    pub running: bool,
}

impl TimerSnapshot {
    /// `mm:ss`, minutes are not wrapped into hours.
    pub fn format_remaining(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.seconds_remaining / 60,
            self.seconds_remaining % 60
        )
    }

    pub fn is_exhausted(&self) -> bool {
        self.seconds_remaining == 0
    }
}

/// Core countdown engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    mode: TimerMode,
    seconds_remaining: u64,
    running: bool,
    /// Stamped every time a countdown starts (including a resume after a
    /// pause); cleared on completion or reset.
    session_start: Option<DateTime<Utc>>,
}

impl TimerEngine {
    /// Idle engine for `mode` with a full `duration_min` countdown.
    pub fn new(mode: TimerMode, duration_min: u64) -> Self {
        Self {
            mode,
            seconds_remaining: duration_min.saturating_mul(60),
            running: false,
            session_start: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            seconds_remaining: self.seconds_remaining,
            running: self.running,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pause a running countdown, or start one from Idle.
    ///
    /// Returns `None` when Idle with nothing left to count down.
    pub fn start_or_toggle(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.running {
            self.running = false;
            return Some(Event::TimerPaused {
                mode: self.mode,
                seconds_remaining: self.seconds_remaining,
                at: now,
            });
        }
        if self.seconds_remaining == 0 {
            return None;
        }
        self.running = true;
        self.session_start = Some(now);
        Some(Event::TimerStarted {
            mode: self.mode,
            seconds_remaining: self.seconds_remaining,
            at: now,
        })
    }

    /// Stop the countdown and refill it with `duration_min` minutes.
    pub fn reset(&mut self, duration_min: u64, now: DateTime<Utc>) -> Event {
        self.running = false;
        self.session_start = None;
        self.seconds_remaining = duration_min.saturating_mul(60);
        Event::TimerReset {
            mode: self.mode,
            seconds_remaining: self.seconds_remaining,
            at: now,
        }
    }

    /// Switch mode; always stops and resets.
    pub fn change_mode(&mut self, mode: TimerMode, duration_min: u64, now: DateTime<Utc>) -> Event {
        self.mode = mode;
        self.reset(duration_min, now);
        Event::ModeChanged {
            mode,
            seconds_remaining: self.seconds_remaining,
            at: now,
        }
    }

    /// Advance by one elapsed second.
    ///
    /// Returns `Some(Event::TimerCompleted)` on the tick that reaches zero.
    /// Ticks while Idle are ignored.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }
        self.running = false;
        let started_at = self.session_start.take().unwrap_or(now);
        Some(Event::TimerCompleted {
            mode: self.mode,
            started_at,
            at: now,
        })
    }
}
