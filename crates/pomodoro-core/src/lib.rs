//! # Pomodoro Core Library
//!
//! Core logic for a single-user Pomodoro timer: alternating work and break
//! intervals, a local history of completed sessions, and user preferences
//! for durations and sounds. Front-ends (the `pomodoro` CLI) are thin layers
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure countdown state machine advanced one second
//!   per `tick()`
//! - **Timer Service**: the async owner of the engine; runs the countdown
//!   task and publishes every snapshot
//! - **Storage**: SQLite session history with a live query, and TOML-based
//!   preferences
//! - **Sound**: ambient/finish-tone cues derived from timer snapshots
//!
//! ## Key Components
//!
//! - [`TimerService`]: start/pause, reset, mode changes, observation
//! - [`Database`]: session persistence and statistics
//! - [`Config`]: preference file management
//! - [`SessionRecorder`]: fire-and-forget writes of completed sessions

pub mod error;
pub mod events;
pub mod recorder;
pub mod sound;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use recorder::SessionRecorder;
pub use sound::{SoundCue, SoundDirector, SoundSink};
pub use storage::{
    Config, ConfigFile, Database, LiveSessions, NewSession, Preferences, SessionLog,
    SessionRecord, SessionStore, SharedConfig, SoundConfig, Stats,
};
pub use timer::{SnapshotWatcher, TimerEngine, TimerMode, TimerService, TimerSnapshot};
