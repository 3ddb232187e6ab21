mod clock;
mod engine;
mod mode;
mod service;

pub use clock::{Clock, MonotonicClock, SystemClock};
pub use engine::{TimerEngine, TimerSnapshot};
pub use mode::TimerMode;
pub use service::{SnapshotWatcher, TimerService};
