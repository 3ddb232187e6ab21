//! Session store boundary and its live query.
//!
//! [`SessionStore`] is the append/query seam; [`Database`] is the shipped
//! implementation. [`SessionLog`] wraps any store, runs its blocking calls off
//! the async executor, and bumps a revision after every successful insert so
//! [`LiveSessions`] subscribers can re-query.

use std::sync::Arc;

use tokio::sync::watch;

use super::database::{Database, NewSession, SessionRecord};
use crate::error::Result;

/// Append-only store of completed sessions.
pub trait SessionStore: Send + Sync + 'static {
    /// Persist `session` and return it with its assigned id.
    fn insert(&self, session: NewSession) -> Result<SessionRecord>;

    /// Every session, most recent start first.
    fn query_all_desc(&self) -> Result<Vec<SessionRecord>>;
}

impl SessionStore for Database {
    fn insert(&self, session: NewSession) -> Result<SessionRecord> {
        Ok(self.insert_session(session)?)
    }

    fn query_all_desc(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions_desc()?)
    }
}

/// Shared handle over a [`SessionStore`] with change notification.
#[derive(Clone)]
pub struct SessionLog {
    store: Arc<dyn SessionStore>,
    revision: Arc<watch::Sender<u64>>,
}

impl SessionLog {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            store,
            revision: Arc::new(revision),
        }
    }

    /// Insert on the blocking pool and notify live queries.
    ///
    /// # Errors
    /// Returns the store's error, or `TaskFailed` if the blocking call panicked.
    pub async fn insert(&self, session: NewSession) -> Result<SessionRecord> {
        let store = Arc::clone(&self.store);
        let record = tokio::task::spawn_blocking(move || store.insert(session)).await??;
        self.revision.send_modify(|rev| *rev += 1);
        Ok(record)
    }

    pub async fn all_desc(&self) -> Result<Vec<SessionRecord>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.query_all_desc()).await?
    }

    /// Number of successful inserts seen by this log.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Start an independent live query.
    pub fn live(&self) -> LiveSessions {
        let mut changes = self.revision.subscribe();
        changes.borrow_and_update();
        LiveSessions {
            log: self.clone(),
            changes,
            primed: false,
        }
    }
}

/// Live reverse-chronological view of the session history.
///
/// The first `next()` yields the current list immediately; each later call
/// waits for at least one insert and yields the refreshed list. Several
/// inserts between calls produce one refresh containing all of them.
pub struct LiveSessions {
    log: SessionLog,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl LiveSessions {
    pub async fn next(&mut self) -> Result<Vec<SessionRecord>> {
        if self.primed {
            // The sender lives in `self.log`, so this never reports closed.
            let _ = self.changes.changed().await;
        }
        self.primed = true;
        self.changes.borrow_and_update();
        self.log.all_desc().await
    }
}
