//! SQLite storage for activities and sessions, plus the transactional timer
//! transitions.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization. Concurrent
//! writers on separate connections (other processes included) are serialized
//! by opening every mutating transaction with
//! `TransactionBehavior::Immediate`, which takes the write lock up front.
//!
//! # Consistency
//!
//! Each transition (`start`, `pause`, `complete`) runs in a single
//! transaction. Status updates and session closes are conditional
//! (`WHERE status = ?`, `WHERE ended_at IS NULL`); an update that matches no
//! rows after the initial read surfaces as
//! [`TimerError::ConcurrencyConflict`], which callers may retry after
//! re-reading. Closing a session when none is open is a no-op, so retries
//! never double-apply a duration. A partial unique index on
//! `sessions(activity_id) WHERE ended_at IS NULL` backs the one-open-session
//! invariant at the schema level.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 format
//! (e.g., `2024-01-15T10:30:00.000Z`): lexicographic ordering matches
//! chronological ordering, values are human-readable, and everything is UTC.
//! Session durations are stored as REAL fractional minutes and are
//! authoritative when present; timestamps are the fallback.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use thiserror::Error;
use uuid::Uuid;

use wt_core::ledger::{self, SessionInterval};
use wt_core::lifecycle::{ActivityStatus, TimerAction, check_transition};
use wt_core::snapshot::ActivitySnapshot;
use wt_core::types::{ActivityId, UserId, ValidationError};
use wt_core::TimerError;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A timer-domain error (not found, illegal transition, lost race).
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {entity_id}: {timestamp}")]
    TimestampParse {
        entity_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored status column holds an unknown value.
    #[error("invalid status for activity {activity_id}")]
    InvalidStatus {
        activity_id: String,
        #[source]
        source: ValidationError,
    },

    /// Activities are created `started` or `paused`, never `completed`.
    #[error("activities cannot be created in status {0}")]
    InvalidInitialStatus(ActivityStatus),
}

/// Parameters for creating an activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: UserId,
    pub category_id: Option<String>,
    pub description: Option<String>,
    /// `started` or `paused`. Creating a running activity pauses the user's
    /// other running activities in the same transaction.
    pub initial_status: ActivityStatus,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety and consistency
/// guarantees.
pub struct Database {
    conn: Connection,
}

#[derive(Debug)]
struct ActivityRow {
    id: String,
    user_id: String,
    category_id: Option<String>,
    description: Option<String>,
    count: i64,
    status: ActivityStatus,
    completed_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                category_id TEXT,
                description TEXT,
                count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT,
                approved_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_activities_user_status
                ON activities(user_id, status);

            -- Sessions table: one row per start-to-pause-or-complete span.
            -- ended_at NULL means the session is open; duration_minutes is
            -- set when the session closes and is authoritative thereafter.
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                activity_id TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                duration_minutes REAL,
                FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_activity ON sessions(activity_id);

            -- At most one open session per activity.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_open
                ON sessions(activity_id) WHERE ended_at IS NULL;
            ",
        )?;
        Ok(())
    }

    /// Creates an activity in status `started` or `paused`.
    pub fn create_activity(&mut self, new: &NewActivity) -> Result<ActivitySnapshot, DbError> {
        self.create_activity_at(new, Utc::now())
    }

    fn create_activity_at(
        &mut self,
        new: &NewActivity,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, DbError> {
        if new.initial_status.is_terminal() {
            return Err(DbError::InvalidInitialStatus(new.initial_status));
        }

        let activity_id = Uuid::new_v4().to_string();
        let now_text = format_timestamp(now);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if new.initial_status == ActivityStatus::Started {
            pause_running_siblings(&tx, &new.user_id, &activity_id, now)?;
        }
        tx.execute(
            "
            INSERT INTO activities
            (id, user_id, category_id, description, count, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?)
            ",
            params![
                activity_id,
                new.user_id.as_str(),
                new.category_id,
                new.description,
                new.initial_status.as_str(),
                now_text,
                now_text,
            ],
        )?;
        if new.initial_status == ActivityStatus::Started {
            open_session(&tx, &activity_id, &now_text)?;
        }
        tx.commit()?;

        tracing::debug!(%activity_id, status = %new.initial_status, "created activity");
        self.snapshot_at(&activity_id, &new.user_id, now)
    }

    /// Starts (or resumes) an activity's timer.
    ///
    /// Every other running activity of the same user is paused first, inside
    /// the same transaction, so at most one activity per user is `started`
    /// once this returns. A storage failure while pausing a sibling rolls
    /// the whole operation back.
    pub fn start_activity(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
    ) -> Result<ActivitySnapshot, DbError> {
        self.start_activity_at(activity, user, Utc::now())
    }

    fn start_activity_at(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, DbError> {
        let now_text = format_timestamp(now);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = load_activity(&tx, activity.as_str(), user)?;
        check_transition(row.status, TimerAction::Start)?;

        // Exclusivity before the target opens its own interval; otherwise
        // two open sessions could double-count elapsed time.
        pause_running_siblings(&tx, user, activity.as_str(), now)?;
        if row.status == ActivityStatus::Paused {
            open_session(&tx, activity.as_str(), &now_text)?;
        }
        set_status(&tx, activity.as_str(), row.status, ActivityStatus::Started, &now_text)?;
        tx.commit()?;

        tracing::debug!(activity_id = %activity, user_id = %user, "started activity");
        self.snapshot_at(activity.as_str(), user, now)
    }

    /// Pauses a running activity, closing its open session.
    pub fn pause_activity(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
    ) -> Result<ActivitySnapshot, DbError> {
        self.pause_activity_at(activity, user, Utc::now())
    }

    fn pause_activity_at(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, DbError> {
        let now_text = format_timestamp(now);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = load_activity(&tx, activity.as_str(), user)?;
        check_transition(row.status, TimerAction::Pause)?;

        close_open_session(&tx, activity.as_str(), now)?;
        set_status(&tx, activity.as_str(), row.status, ActivityStatus::Paused, &now_text)?;
        tx.commit()?;

        tracing::debug!(activity_id = %activity, user_id = %user, "paused activity");
        self.snapshot_at(activity.as_str(), user, now)
    }

    /// Completes an activity from `started` or `paused`.
    ///
    /// Closes the open session if one exists. `completed_at` is set exactly
    /// once, at the one legal transition into `completed`. An optional final
    /// count and closing notes can be recorded in the same transaction.
    pub fn complete_activity(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
        final_count: Option<i64>,
        notes: Option<&str>,
    ) -> Result<ActivitySnapshot, DbError> {
        self.complete_activity_at(activity, user, final_count, notes, Utc::now())
    }

    fn complete_activity_at(
        &mut self,
        activity: &ActivityId,
        user: &UserId,
        final_count: Option<i64>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, DbError> {
        let now_text = format_timestamp(now);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = load_activity(&tx, activity.as_str(), user)?;
        check_transition(row.status, TimerAction::Complete)?;

        close_open_session(&tx, activity.as_str(), now)?;
        let updated = tx.execute(
            "
            UPDATE activities
            SET status = 'completed',
                completed_at = COALESCE(completed_at, ?),
                count = COALESCE(?, count),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ? AND status = ?
            ",
            params![
                now_text,
                final_count,
                notes,
                now_text,
                activity.as_str(),
                row.status.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(TimerError::ConcurrencyConflict {
                activity_id: activity.to_string(),
            }
            .into());
        }
        tx.commit()?;

        tracing::debug!(activity_id = %activity, user_id = %user, "completed activity");
        self.snapshot_at(activity.as_str(), user, now)
    }

    /// Reads an activity with its sessions and current total duration.
    pub fn get_activity(
        &self,
        activity: &ActivityId,
        user: &UserId,
    ) -> Result<ActivitySnapshot, DbError> {
        self.snapshot_at(activity.as_str(), user, Utc::now())
    }

    /// Lists a user's activities, optionally filtered by status.
    ///
    /// Ordered by creation time, oldest first. All open-session accruals use
    /// the same clock reading.
    pub fn list_activities(
        &self,
        user: &UserId,
        status: Option<ActivityStatus>,
    ) -> Result<Vec<ActivitySnapshot>, DbError> {
        self.list_activities_at(user, status, Utc::now())
    }

    fn list_activities_at(
        &self,
        user: &UserId,
        status: Option<ActivityStatus>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActivitySnapshot>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id FROM activities
            WHERE user_id = ? AND (? IS NULL OR status = ?)
            ORDER BY created_at ASC, id ASC
            ",
        )?;
        let status_text = status.map(|s| s.as_str());
        let rows = stmt.query_map(params![user.as_str(), status_text, status_text], |row| {
            row.get::<_, String>(0)
        })?;
        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(self.snapshot_at(&row?, user, now)?);
        }
        Ok(snapshots)
    }

    /// Returns the user's currently running activity, if any.
    ///
    /// The exclusivity invariant guarantees at most one.
    pub fn running_activity(&self, user: &UserId) -> Result<Option<ActivitySnapshot>, DbError> {
        self.running_activity_at(user, Utc::now())
    }

    fn running_activity_at(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ActivitySnapshot>, DbError> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM activities WHERE user_id = ? AND status = 'started' LIMIT 1",
                params![user.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => Ok(Some(self.snapshot_at(&id, user, now)?)),
            None => Ok(None),
        }
    }

    /// Deletes an activity and, by cascade, all of its sessions.
    pub fn delete_activity(&mut self, activity: &ActivityId, user: &UserId) -> Result<(), DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM activities WHERE id = ? AND user_id = ?",
            params![activity.as_str(), user.as_str()],
        )?;
        if deleted == 0 {
            return Err(TimerError::NotFound {
                activity_id: activity.to_string(),
            }
            .into());
        }
        tracing::debug!(activity_id = %activity, "deleted activity");
        Ok(())
    }

    fn snapshot_at(
        &self,
        activity_id: &str,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, DbError> {
        let row = load_activity(&self.conn, activity_id, user)?;
        let intervals = load_sessions(&self.conn, activity_id)?;
        let (sessions, total_duration_minutes) =
            ActivitySnapshot::resolve_sessions(&intervals, now);
        Ok(ActivitySnapshot {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            category_id: row.category_id,
            description: row.description,
            count: row.count,
            completed_at: row.completed_at,
            approved_at: row.approved_at,
            sessions,
            total_duration_minutes,
        })
    }
}

/// Loads one activity, checking ownership.
///
/// An activity belonging to another user reads as `NotFound`; ownership is
/// not leaked through a distinct error.
fn load_activity(
    conn: &Connection,
    activity_id: &str,
    user: &UserId,
) -> Result<ActivityRow, DbError> {
    let raw = conn
        .query_row(
            "
            SELECT id, user_id, category_id, description, count, status, completed_at, approved_at
            FROM activities
            WHERE id = ? AND user_id = ?
            ",
            params![activity_id, user.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;
    let Some((id, user_id, category_id, description, count, status, completed_at, approved_at)) =
        raw
    else {
        return Err(TimerError::NotFound {
            activity_id: activity_id.to_string(),
        }
        .into());
    };

    let status = status
        .parse::<ActivityStatus>()
        .map_err(|source| DbError::InvalidStatus {
            activity_id: id.clone(),
            source,
        })?;
    let completed_at = parse_opt_timestamp(completed_at, &id)?;
    let approved_at = parse_opt_timestamp(approved_at, &id)?;
    Ok(ActivityRow {
        id,
        user_id,
        category_id,
        description,
        count,
        status,
        completed_at,
        approved_at,
    })
}

/// Loads an activity's session intervals, oldest first.
fn load_sessions(conn: &Connection, activity_id: &str) -> Result<Vec<SessionInterval>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, started_at, ended_at, duration_minutes
        FROM sessions
        WHERE activity_id = ?
        ORDER BY started_at ASC, id ASC
        ",
    )?;
    let rows = stmt.query_map(params![activity_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<f64>>(3)?,
        ))
    })?;
    let mut intervals = Vec::new();
    for row in rows {
        let (session_id, started_at, ended_at, duration_minutes) = row?;
        let started_at = parse_timestamp(&started_at, &session_id)?;
        let ended_at = parse_opt_timestamp(ended_at, &session_id)?;
        intervals.push(SessionInterval {
            started_at,
            ended_at,
            duration_minutes,
        });
    }
    Ok(intervals)
}

/// Pauses every running activity of `user` other than `exclude`.
///
/// Runs before the target activity opens its own session, so no user ever
/// has two open sessions. Any failure here aborts the caller's transaction.
fn pause_running_siblings(
    conn: &Connection,
    user: &UserId,
    exclude: &str,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM activities WHERE user_id = ? AND status = 'started' AND id != ?",
    )?;
    let rows = stmt.query_map(params![user.as_str(), exclude], |row| {
        row.get::<_, String>(0)
    })?;
    let mut siblings = Vec::new();
    for row in rows {
        siblings.push(row?);
    }

    let now_text = format_timestamp(now);
    for sibling_id in siblings {
        let closed = close_open_session(conn, &sibling_id, now)?;
        tracing::debug!(
            activity_id = %sibling_id,
            session_closed = closed,
            "pausing sibling activity for exclusive start"
        );
        let updated = conn.execute(
            "UPDATE activities SET status = 'paused', updated_at = ? WHERE id = ? AND status = 'started'",
            params![now_text, sibling_id],
        )?;
        if updated == 0 {
            return Err(TimerError::ConcurrencyConflict {
                activity_id: sibling_id,
            }
            .into());
        }
    }
    Ok(())
}

/// Closes the open session for an activity, if one exists.
///
/// Returns whether a session was closed. Closing when nothing is open is a
/// no-op, so concurrent closers cannot double-apply a duration. The read and
/// the conditional update form one atomic unit inside the caller's
/// transaction.
fn close_open_session(
    conn: &Connection,
    activity_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let open: Option<(String, String)> = conn
        .query_row(
            "SELECT id, started_at FROM sessions WHERE activity_id = ? AND ended_at IS NULL",
            params![activity_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((session_id, started_at)) = open else {
        return Ok(false);
    };

    let started_at = parse_timestamp(&started_at, &session_id)?;
    let (minutes, anomalous) = ledger::span_minutes(started_at, now);
    if anomalous {
        tracing::warn!(
            %session_id,
            %started_at,
            ended_at = %now,
            "session ends before it starts; recording zero minutes"
        );
    }
    let updated = conn.execute(
        "UPDATE sessions SET ended_at = ?, duration_minutes = ? WHERE id = ? AND ended_at IS NULL",
        params![format_timestamp(now), minutes, session_id],
    )?;
    if updated == 0 {
        // Another writer closed it between the read and the update.
        return Err(TimerError::ConcurrencyConflict {
            activity_id: activity_id.to_string(),
        }
        .into());
    }
    Ok(true)
}

/// Opens a new session interval for an activity.
///
/// The partial unique index turns a double-open into a constraint violation,
/// reported as a concurrency conflict.
fn open_session(conn: &Connection, activity_id: &str, now_text: &str) -> Result<(), DbError> {
    let session_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sessions (id, activity_id, started_at) VALUES (?, ?, ?)",
        params![session_id, activity_id, now_text],
    )
    .map_err(|err| match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Timer(TimerError::ConcurrencyConflict {
                activity_id: activity_id.to_string(),
            })
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// Conditionally moves an activity from one status to another.
fn set_status(
    conn: &Connection,
    activity_id: &str,
    from: ActivityStatus,
    to: ActivityStatus,
    now_text: &str,
) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE activities SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        params![to.as_str(), now_text, activity_id, from.as_str()],
    )?;
    if updated == 0 {
        return Err(TimerError::ConcurrencyConflict {
            activity_id: activity_id.to_string(),
        }
        .into());
    }
    Ok(())
}

fn parse_timestamp(timestamp: &str, entity_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            entity_id: entity_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn parse_opt_timestamp(
    timestamp: Option<String>,
    entity_id: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    timestamp
        .map(|value| parse_timestamp(&value, entity_id))
        .transpose()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
