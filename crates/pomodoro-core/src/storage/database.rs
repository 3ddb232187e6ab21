//! SQLite-based session storage and statistics.
//!
//! One append-only table of completed intervals. Rows are never updated or
//! deleted here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, ValidationError};
use crate::timer::TimerMode;

use super::data_dir;

/// A completed interval as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Configured duration of the mode, not `end_time - start_time`.
    pub duration_minutes: u64,
    pub mode: TimerMode,
}

/// A completed interval that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_minutes: u64,
    mode: TimerMode,
}

impl NewSession {
    /// # Errors
    /// Returns `InvalidTimeRange` unless `end_time > start_time`.
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_minutes: u64,
        mode: TimerMode,
    ) -> Result<Self, ValidationError> {
        if end_time <= start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            duration_minutes,
            mode,
        })
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn duration_minutes(&self) -> u64 {
        self.duration_minutes
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Stored timestamps keep microsecond precision.
    fn with_id(self, id: i64) -> SessionRecord {
        SessionRecord {
            id,
            start_time: self.start_time.trunc_subsecs(6),
            end_time: self.end_time.trunc_subsecs(6),
            duration_minutes: self.duration_minutes,
            mode: self.mode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub work_sessions: u64,
    pub work_min: u64,
    pub short_break_sessions: u64,
    pub long_break_sessions: u64,
    pub break_min: u64,
}

impl Stats {
    fn add(&mut self, mode: TimerMode, count: u64, minutes: u64) {
        self.total_sessions += count;
        match mode {
            TimerMode::Work => {
                self.work_sessions += count;
                self.work_min += minutes;
            }
            TimerMode::ShortBreak => {
                self.short_break_sessions += count;
                self.break_min += minutes;
            }
            TimerMode::LongBreak => {
                self.long_break_sessions += count;
                self.break_min += minutes;
            }
        }
    }
}

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so one `Database` can be shared
/// between the recorder task and readers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/pomodoro.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("pomodoro.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS timer_sessions (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    start_time  TEXT NOT NULL,
                    end_time    TEXT NOT NULL,
                    duration    INTEGER NOT NULL,
                    mode        TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_timer_sessions_start_time ON timer_sessions(start_time);
                CREATE INDEX IF NOT EXISTS idx_timer_sessions_mode ON timer_sessions(mode);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Append a completed session and return it with its assigned id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(&self, session: NewSession) -> Result<SessionRecord, DatabaseError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO timer_sessions (start_time, end_time, duration, mode)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                to_db_time(session.start_time),
                to_db_time(session.end_time),
                session.duration_minutes,
                session.mode.storage_name(),
            ],
        )?;
        Ok(session.with_id(conn.last_insert_rowid()))
    }

    /// All sessions, most recent start first.
    pub fn sessions_desc(&self) -> Result<Vec<SessionRecord>, DatabaseError> {
        self.query_sessions(None)
    }

    /// The `limit` most recent sessions.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        self.query_sessions(Some(limit))
    }

    fn query_sessions(&self, limit: Option<usize>) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn()?;
        // Fixed-width UTC timestamps sort chronologically as text.
        let mut stmt = conn.prepare(
            "SELECT id, start_time, end_time, duration, mode
             FROM timer_sessions
             ORDER BY start_time DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![limit], raw_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(decode(row?)?);
        }
        Ok(sessions)
    }

    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(Some(format!("{today}T00:00:00.000000Z")))
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        self.stats_since(None)
    }

    fn stats_since(&self, since: Option<String>) -> Result<Stats, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration), 0)
             FROM timer_sessions
             WHERE ?1 IS NULL OR start_time >= ?1
             GROUP BY mode",
        )?;

        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (mode, count, minutes) = row?;
            match mode.parse::<TimerMode>() {
                Ok(mode) => stats.add(mode, count, minutes),
                Err(_) => tracing::warn!(mode = %mode, "skipping sessions with unknown mode"),
            }
        }
        Ok(stats)
    }
}

type RawRow = (i64, String, String, u64, String);

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode((id, start, end, duration, mode): RawRow) -> Result<SessionRecord, DatabaseError> {
    let corrupt = |message: String| DatabaseError::CorruptRow { id, message };
    Ok(SessionRecord {
        id,
        start_time: parse_datetime(&start).map_err(corrupt)?,
        end_time: parse_datetime(&end).map_err(corrupt)?,
        duration_minutes: duration,
        mode: mode.parse().map_err(|e: ValidationError| corrupt(e.to_string()))?,
    })
}

fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid datetime '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(start: DateTime<Utc>, minutes: u64, mode: TimerMode) -> NewSession {
        NewSession::new(start, start + Duration::minutes(minutes as i64), minutes, mode).unwrap()
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let a = db.insert_session(draft(now, 25, TimerMode::Work)).unwrap();
        let b = db.insert_session(draft(now, 5, TimerMode::ShortBreak)).unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.mode, TimerMode::Work);
        assert_eq!(a.duration_minutes, 25);
    }

    #[test]
    fn sessions_are_newest_first() {
        let db = Database::open_memory().unwrap();
        let base = Utc::now() - Duration::hours(3);
        db.insert_session(draft(base + Duration::hours(1), 5, TimerMode::ShortBreak))
            .unwrap();
        db.insert_session(draft(base, 25, TimerMode::Work)).unwrap();
        db.insert_session(draft(base + Duration::hours(2), 15, TimerMode::LongBreak))
            .unwrap();

        let modes: Vec<_> = db.sessions_desc().unwrap().into_iter().map(|s| s.mode).collect();
        assert_eq!(
            modes,
            vec![TimerMode::LongBreak, TimerMode::ShortBreak, TimerMode::Work]
        );
        assert_eq!(db.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn timestamps_roundtrip_through_storage() {
        let db = Database::open_memory().unwrap();
        let start = DateTime::parse_from_rfc3339("2026-05-04T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let stored = db.insert_session(draft(start, 25, TimerMode::Work)).unwrap();
        let loaded = db.sessions_desc().unwrap();
        assert_eq!(loaded, vec![stored]);
    }

    #[test]
    fn stats_split_work_and_breaks() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now() - Duration::hours(1);
        db.insert_session(draft(now, 25, TimerMode::Work)).unwrap();
        db.insert_session(draft(now, 25, TimerMode::Work)).unwrap();
        db.insert_session(draft(now, 5, TimerMode::ShortBreak)).unwrap();
        db.insert_session(draft(now, 15, TimerMode::LongBreak)).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.work_sessions, 2);
        assert_eq!(stats.work_min, 50);
        assert_eq!(stats.break_min, 20);
        assert_eq!(stats.long_break_sessions, 1);
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = Utc::now();
        assert!(matches!(
            NewSession::new(now, now, 25, TimerMode::Work),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.insert_session(draft(Utc::now(), 25, TimerMode::Work)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.sessions_desc().unwrap().len(), 1);
    }
}
