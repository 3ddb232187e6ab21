//! Fire-and-forget persistence of completed intervals.

use tokio::task::JoinHandle;

use crate::storage::{NewSession, SessionLog, SessionRecord};

/// Hands completed sessions to the store without blocking the timer.
#[derive(Clone)]
pub struct SessionRecorder {
    log: SessionLog,
}

impl SessionRecorder {
    pub fn new(log: SessionLog) -> Self {
        Self { log }
    }

    /// Write `session` on a detached task.
    ///
    /// Failures are logged and dropped; no retry. The returned handle
    /// resolves to the stored record, or `None` if the write failed. The
    /// timer never awaits it.
    pub fn record(&self, session: NewSession) -> JoinHandle<Option<SessionRecord>> {
        let log = self.log.clone();
        tokio::spawn(async move {
            let mode = session.mode();
            match log.insert(session).await {
                Ok(record) => {
                    tracing::info!(
                        id = record.id,
                        mode = ?record.mode,
                        minutes = record.duration_minutes,
                        "session recorded"
                    );
                    Some(record)
                }
                Err(e) => {
                    tracing::warn!(error = %e, ?mode, "failed to record session");
                    None
                }
            }
        })
    }
}
