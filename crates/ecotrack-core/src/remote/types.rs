//! Types and error kinds for the remote data store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Closed error classification for remote operations.
///
/// Produced only at the adapter boundary; upper layers match on these
/// kinds and never inspect backend-specific error shapes.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No record exists for the key. Benign: callers treat it as empty
    /// initial state.
    #[error("no remote record found")]
    NotFound,

    /// The call was rejected because credentials are expired or invalid.
    /// Triggers exactly one refresh-and-retry.
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    /// Network failure or any other remote error. Logged and absorbed;
    /// the local snapshot carries the data.
    #[error("transient remote failure: {0}")]
    Transient(String),
}

/// Durable snapshot of one identity's progress (`user_progress` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    /// Completed goal ids in `"{category}-{text}"` composite form.
    pub completed_goals: Vec<String>,
    /// Freshly recomputed total at write time, never a passed-through value.
    pub points: u32,
    pub last_updated: DateTime<Utc>,
}

/// A shared daily bonus task (`global_daily_tasks` row).
///
/// Rows are global: every user sees the same set for a given date.
/// Completion is tracked per identity, never on the row itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTaskRow {
    /// Deterministic id (`task-{date}-{n}`) so racing generators collide
    /// on the primary key instead of duplicating tasks.
    pub id: String,
    pub task_text: String,
    pub category: String,
    pub points: u32,
    pub task_date: NaiveDate,
}

/// Keyed access to the remote tables.
///
/// Implementations classify every failure into [`RemoteError`]; callers
/// rely on the three kinds for fallback and retry decisions.
pub trait RemoteStore: Send + Sync {
    /// Fetch the progress record for an identity.
    /// `Err(NotFound)` when no row exists.
    fn fetch_progress(&self, user_id: &str) -> Result<ProgressRecord, RemoteError>;

    /// Insert or overwrite the progress record keyed by its user id.
    fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), RemoteError>;

    /// All shared daily tasks for a date. Empty vec when none generated yet.
    fn fetch_daily_tasks(&self, date: NaiveDate) -> Result<Vec<DailyTaskRow>, RemoteError>;

    /// Insert a batch of daily tasks. Rows whose id already exists are
    /// ignored, so concurrent generators converge on one set.
    fn insert_daily_tasks(&self, rows: &[DailyTaskRow]) -> Result<(), RemoteError>;

    /// Task ids the identity has completed on `date`.
    fn fetch_completions(&self, user_id: &str, date: NaiveDate) -> Result<Vec<String>, RemoteError>;

    /// Record one completion. Inserting the same (user, task, date) again
    /// is a no-op, keeping completion idempotent.
    fn insert_completion(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), RemoteError>;
}

/// Classify an HTTP response status into a [`RemoteError`].
pub fn classify_status(status: u16, body: &str) -> RemoteError {
    match status {
        401 | 403 => RemoteError::SessionInvalid(format!("HTTP {status}: {body}")),
        404 | 406 => RemoteError::NotFound,
        _ => RemoteError::Transient(format!("HTTP {status}: {body}")),
    }
}

/// Classify a transport-level reqwest failure.
pub fn classify_transport(err: &reqwest::Error) -> RemoteError {
    RemoteError::Transient(err.to_string())
}
