//! Async owner of the timer.
//!
//! Serializes every engine operation behind one mutex, runs the one-second
//! countdown task, publishes a snapshot after every tick and transition, and
//! hands natural completions to the [`SessionRecorder`].
//!
//! Each countdown is tagged with a generation number. Pausing, resetting and
//! changing mode bump the generation and abort the task, and the task checks
//! its generation under the lock before every tick, so a late wake-up from a
//! stale countdown never touches the engine.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::clock::{Clock, MonotonicClock};
use super::engine::{TimerEngine, TimerSnapshot};
use super::mode::TimerMode;
use crate::events::Event;
use crate::recorder::SessionRecorder;
use crate::storage::{LiveSessions, NewSession, Preferences, SessionLog};

const TICK: Duration = Duration::from_secs(1);
const SNAPSHOT_BUFFER: usize = 256;

/// Handle to a running timer. Cheap to clone; all clones share one engine.
#[derive(Clone)]
pub struct TimerService {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<ServiceState>,
    prefs: Arc<dyn Preferences>,
    clock: Arc<dyn Clock>,
    sessions: SessionLog,
    recorder: SessionRecorder,
    snapshots: broadcast::Sender<TimerSnapshot>,
}

struct ServiceState {
    engine: TimerEngine,
    generation: u64,
    countdown: Option<JoinHandle<()>>,
}

impl ServiceState {
    fn cancel_countdown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().cancel_countdown();
    }
}

impl TimerService {
    /// Idle timer in work mode, timestamps from a [`MonotonicClock`].
    pub fn new(sessions: SessionLog, prefs: Arc<dyn Preferences>) -> Self {
        Self::with_clock(sessions, prefs, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(sessions: SessionLog, prefs: Arc<dyn Preferences>, clock: Arc<dyn Clock>) -> Self {
        let mode = TimerMode::default();
        let engine = TimerEngine::new(mode, prefs.duration_minutes(mode));
        let (snapshots, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ServiceState {
                    engine,
                    generation: 0,
                    countdown: None,
                }),
                prefs,
                clock,
                recorder: SessionRecorder::new(sessions.clone()),
                sessions,
                snapshots,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.inner.state.lock().await.engine.snapshot()
    }

    /// Subscribe to every snapshot, starting with the current one.
    pub async fn observe_snapshot(&self) -> SnapshotWatcher {
        // Subscribing under the lock means no publish can fall between
        // reading the current value and joining the channel.
        let state = self.inner.state.lock().await;
        SnapshotWatcher {
            pending: Some(state.engine.snapshot()),
            rx: self.inner.snapshots.subscribe(),
        }
    }

    /// Live session history, most recent first.
    pub fn observe_sessions(&self) -> LiveSessions {
        self.inner.sessions.live()
    }

    pub fn sessions(&self) -> &SessionLog {
        &self.inner.sessions
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pause a running countdown or start one. `None` when there is nothing
    /// left to count down.
    pub async fn start_or_toggle(&self) -> Option<Event> {
        let mut state = self.inner.state.lock().await;
        let event = state.engine.start_or_toggle(self.inner.clock.now())?;
        state.cancel_countdown();
        if state.engine.is_running() {
            let generation = state.generation;
            state.countdown = Some(tokio::spawn(run_countdown(
                Arc::downgrade(&self.inner),
                generation,
            )));
        }
        self.inner.publish(&state.engine, &event);
        Some(event)
    }

    pub async fn reset(&self) -> Event {
        let mut state = self.inner.state.lock().await;
        state.cancel_countdown();
        let minutes = self.inner.prefs.duration_minutes(state.engine.mode());
        let event = state.engine.reset(minutes, self.inner.clock.now());
        self.inner.publish(&state.engine, &event);
        event
    }

    pub async fn change_mode(&self, mode: TimerMode) -> Event {
        let mut state = self.inner.state.lock().await;
        state.cancel_countdown();
        let minutes = self.inner.prefs.duration_minutes(mode);
        let event = state.engine.change_mode(mode, minutes, self.inner.clock.now());
        self.inner.publish(&state.engine, &event);
        event
    }
}

impl Inner {
    fn publish(&self, engine: &TimerEngine, event: &Event) {
        tracing::debug!(?event, "timer transition");
        self.send_snapshot(engine);
    }

    fn send_snapshot(&self, engine: &TimerEngine) {
        // No subscribers is fine.
        let _ = self.snapshots.send(engine.snapshot());
    }

    fn complete(&self, event: &Event) {
        let Event::TimerCompleted {
            mode,
            started_at,
            at,
        } = *event
        else {
            return;
        };
        let minutes = self.prefs.duration_minutes(mode);
        tracing::info!(?mode, minutes, "interval completed");
        match NewSession::new(started_at, at, minutes, mode) {
            Ok(session) => {
                self.recorder.record(session);
            }
            Err(e) => tracing::warn!(error = %e, "dropping completed session"),
        }
    }
}

async fn run_countdown(weak: Weak<Inner>, generation: u64) {
    let mut ticks = interval_at(Instant::now() + TICK, TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
    loop {
        ticks.tick().await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let mut state = inner.state.lock().await;
        if state.generation != generation {
            return;
        }
        let now = inner.clock.now();
        match state.engine.tick(now) {
            None => inner.send_snapshot(&state.engine),
            Some(event) => {
                // The engine is already Idle; drop our own handle without aborting.
                state.countdown = None;
                inner.complete(&event);
                inner.publish(&state.engine, &event);
                return;
            }
        }
    }
}

/// Receives every published snapshot in order.
pub struct SnapshotWatcher {
    pending: Option<TimerSnapshot>,
    rx: broadcast::Receiver<TimerSnapshot>,
}

impl SnapshotWatcher {
    /// Next snapshot; the first call returns the state at subscription time.
    /// `None` once the service is gone.
    pub async fn recv(&mut self) -> Option<TimerSnapshot> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "snapshot subscriber fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
