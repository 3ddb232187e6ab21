//! Time sources for session timestamps.

use chrono::{DateTime, Duration, Utc};
use tokio::time::Instant;

/// Supplies the instants written into session records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Plain wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock anchored once, then advanced by the tokio monotonic clock.
///
/// Never goes backwards when the system clock is adjusted, and follows
/// `tokio::time::pause`/`advance` in tests, so a session that ticked for N
/// seconds always ends N seconds after it started.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    wall_anchor: DateTime<Utc>,
    mono_anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(wall_anchor: DateTime<Utc>) -> Self {
        Self {
            wall_anchor,
            mono_anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.mono_anchor.elapsed()).unwrap_or_else(|_| Duration::zero());
        self.wall_anchor + elapsed
    }
}
