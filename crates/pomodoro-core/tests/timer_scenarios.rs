//! End-to-end timer scenarios.
//!
//! Runs the service on a paused tokio clock: every `recv()` on the snapshot
//! watcher lets the runtime auto-advance to the next one-second tick.

use std::sync::Arc;
use std::time::Duration;

use pomodoro_core::error::Result;
use pomodoro_core::{
    CoreError, Database, DatabaseError, NewSession, SessionLog, SessionRecord, SessionStore,
    SharedConfig, SnapshotWatcher, TimerMode, TimerService, TimerSnapshot,
};

fn timer_with(prefs: SharedConfig) -> TimerService {
    let log = SessionLog::new(Arc::new(Database::open_memory().unwrap()));
    TimerService::new(log, Arc::new(prefs))
}

/// Subscribe, start, and skip past the subscription and start snapshots.
async fn start(timer: &TimerService) -> SnapshotWatcher {
    let mut watcher = timer.observe_snapshot().await;
    watcher.recv().await.unwrap();
    timer.start_or_toggle().await.expect("timer should start");
    assert!(watcher.recv().await.unwrap().running);
    watcher
}

async fn tick(watcher: &mut SnapshotWatcher, n: u64) -> TimerSnapshot {
    let mut last = None;
    for _ in 0..n {
        last = watcher.recv().await;
    }
    last.expect("timer dropped")
}

#[tokio::test(start_paused = true)]
async fn full_work_interval_records_one_session() {
    let timer = timer_with(SharedConfig::default());
    let mut history = timer.observe_sessions();
    assert!(history.next().await.unwrap().is_empty());

    assert_eq!(timer.snapshot().await.seconds_remaining, 1500);
    let mut watcher = start(&timer).await;
    let last = tick(&mut watcher, 1500).await;
    assert_eq!(
        last,
        TimerSnapshot {
            mode: TimerMode::Work,
            seconds_remaining: 0,
            running: false,
        }
    );

    let sessions = history.next().await.unwrap();
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];
    assert_eq!(session.mode, TimerMode::Work);
    assert_eq!(session.duration_minutes, 25);
    assert!(session.end_time > session.start_time);
    assert_eq!((session.end_time - session.start_time).num_seconds(), 1500);
}

#[tokio::test(start_paused = true)]
async fn pausing_a_short_break_keeps_remaining_time() {
    let timer = timer_with(SharedConfig::default());
    timer.change_mode(TimerMode::ShortBreak).await;
    assert_eq!(timer.snapshot().await.seconds_remaining, 300);

    let mut watcher = start(&timer).await;
    tick(&mut watcher, 10).await;
    timer.start_or_toggle().await.unwrap();

    let paused = timer.snapshot().await;
    assert_eq!(
        paused,
        TimerSnapshot {
            mode: TimerMode::ShortBreak,
            seconds_remaining: 290,
            running: false,
        }
    );

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(timer.snapshot().await, paused);
    assert_eq!(timer.sessions().revision(), 0);
}

#[tokio::test(start_paused = true)]
async fn resuming_continues_from_the_paused_value() {
    let timer = timer_with(SharedConfig::default());
    let mut watcher = start(&timer).await;
    tick(&mut watcher, 10).await;
    timer.start_or_toggle().await.unwrap();
    watcher.recv().await.unwrap();

    timer.start_or_toggle().await.unwrap();
    let resumed = watcher.recv().await.unwrap();
    assert!(resumed.running);
    assert_eq!(resumed.seconds_remaining, 1490);

    assert_eq!(tick(&mut watcher, 10).await.seconds_remaining, 1480);
    assert_eq!(timer.sessions().revision(), 0);
}

#[tokio::test(start_paused = true)]
async fn changing_mode_mid_run_stops_without_recording() {
    let timer = timer_with(SharedConfig::default());
    let mut watcher = start(&timer).await;
    assert_eq!(tick(&mut watcher, 500).await.seconds_remaining, 1000);

    timer.change_mode(TimerMode::ShortBreak).await;
    assert_eq!(
        timer.snapshot().await,
        TimerSnapshot {
            mode: TimerMode::ShortBreak,
            seconds_remaining: 300,
            running: false,
        }
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(timer.snapshot().await.seconds_remaining, 300);
    assert!(timer.sessions().all_desc().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn change_mode_resets_to_configured_duration() {
    let prefs = SharedConfig::default();
    prefs.update(|cfg| {
        cfg.durations.work = 50;
        cfg.durations.long_break = 20;
    });
    let timer = timer_with(prefs);

    for (mode, minutes) in [
        (TimerMode::Work, 50),
        (TimerMode::ShortBreak, 5),
        (TimerMode::LongBreak, 20),
    ] {
        timer.change_mode(mode).await;
        let snap = timer.snapshot().await;
        assert_eq!(snap.mode, mode);
        assert!(!snap.running);
        assert_eq!(snap.seconds_remaining, minutes * 60);
    }
}

#[tokio::test(start_paused = true)]
async fn reset_is_idempotent() {
    let timer = timer_with(SharedConfig::default());
    let mut watcher = start(&timer).await;
    tick(&mut watcher, 3).await;

    timer.reset().await;
    let once = timer.snapshot().await;
    timer.reset().await;
    assert_eq!(timer.snapshot().await, once);
    assert_eq!(once.seconds_remaining, 1500);
    assert!(!once.running);
}

#[tokio::test(start_paused = true)]
async fn exhausted_timer_ignores_start() {
    let prefs = SharedConfig::default();
    prefs.update(|cfg| cfg.durations.short_break = 1);
    let timer = timer_with(prefs);
    timer.change_mode(TimerMode::ShortBreak).await;

    let mut watcher = start(&timer).await;
    tick(&mut watcher, 60).await;
    let done = timer.snapshot().await;
    assert_eq!(done.seconds_remaining, 0);

    assert!(timer.start_or_toggle().await.is_none());
    assert_eq!(timer.snapshot().await, done);
}

#[tokio::test(start_paused = true)]
async fn completion_uses_duration_configured_at_completion() {
    let prefs = SharedConfig::default();
    prefs.update(|cfg| cfg.durations.long_break = 1);
    let timer = timer_with(prefs.clone());
    timer.change_mode(TimerMode::LongBreak).await;
    let mut history = timer.observe_sessions();
    history.next().await.unwrap();

    let mut watcher = start(&timer).await;
    tick(&mut watcher, 30).await;
    prefs.update(|cfg| cfg.durations.long_break = 2);
    tick(&mut watcher, 30).await;

    let sessions = history.next().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_minutes, 2);
    assert_eq!(sessions[0].mode, TimerMode::LongBreak);
}

struct BrokenStore;

impl SessionStore for BrokenStore {
    fn insert(&self, _session: NewSession) -> Result<SessionRecord> {
        Err(CoreError::Database(DatabaseError::Locked))
    }

    fn query_all_desc(&self) -> Result<Vec<SessionRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_does_not_block_the_next_interval() {
    let prefs = SharedConfig::default();
    prefs.update(|cfg| cfg.durations.work = 1);
    let timer = TimerService::new(SessionLog::new(Arc::new(BrokenStore)), Arc::new(prefs));

    let mut watcher = start(&timer).await;
    let done = tick(&mut watcher, 60).await;
    assert_eq!(done.seconds_remaining, 0);
    assert!(!done.running);

    timer.change_mode(TimerMode::ShortBreak).await;
    assert!(timer.start_or_toggle().await.is_some());
    assert!(timer.snapshot().await.running);
    assert_eq!(timer.sessions().revision(), 0);
}

#[tokio::test(start_paused = true)]
async fn back_to_back_intervals_are_listed_newest_first() {
    let prefs = SharedConfig::default();
    prefs.update(|cfg| {
        cfg.durations.work = 1;
        cfg.durations.short_break = 1;
    });
    let timer = timer_with(prefs);
    let mut history = timer.observe_sessions();
    history.next().await.unwrap();

    let mut watcher = start(&timer).await;
    tick(&mut watcher, 60).await;
    history.next().await.unwrap();

    timer.change_mode(TimerMode::ShortBreak).await;
    watcher.recv().await.unwrap();
    timer.start_or_toggle().await.unwrap();
    watcher.recv().await.unwrap();
    tick(&mut watcher, 60).await;

    let sessions = history.next().await.unwrap();
    let modes: Vec<_> = sessions.iter().map(|s| s.mode).collect();
    assert_eq!(modes, vec![TimerMode::ShortBreak, TimerMode::Work]);
    assert!(sessions[0].id > sessions[1].id);
}
