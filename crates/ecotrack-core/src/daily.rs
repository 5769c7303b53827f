//! Daily bonus task generation and completion.
//!
//! The task batch for a date is shared by all users: a deterministic
//! rotation over the template pool, keyed by the tracker-day number. Row
//! ids are derived from the date and slot, so concurrent first-openers
//! generate identical rows and the race resolves through ignore-duplicate
//! inserts. Completion state is per identity: signed-in users keep it in
//! the remote completion table, anonymous users in a date-stamped local
//! list that is pruned after a retention window.

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::auth::Identity;
use crate::catalog::Catalog;
use crate::remote::{DailyTaskRow, RemoteStore};
use crate::storage::local::LocalStore;
use crate::storage::snapshot::keys;

/// Tasks generated per tracker day.
pub const DAILY_BATCH_SIZE: usize = 3;

/// Tracker days roll over at local midnight in UTC+3.
const TRACKER_UTC_OFFSET_HOURS: i32 = 3;

/// The date a given instant belongs to for daily-task purposes.
pub fn tracker_date(now: DateTime<Utc>) -> NaiveDate {
    let offset = FixedOffset::east_opt(TRACKER_UTC_OFFSET_HOURS * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    now.with_timezone(&offset).date_naive()
}

/// A daily task as presented to the caller, with its completion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTask {
    pub id: String,
    pub text: String,
    pub category: String,
    pub points: u32,
    pub completed: bool,
}

/// Outcome of a completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// Completion recorded on every applicable backend.
    Completed,
    /// The task was already completed; points are not awarded twice.
    AlreadyCompleted,
    /// The remote write failed; the completion is held locally.
    DegradedLocal,
}

/// Generates, fetches and completes the shared daily task batch.
pub struct DailyTaskEngine {
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
}

impl DailyTaskEngine {
    pub fn new(remote: Arc<dyn RemoteStore>, local: Arc<dyn LocalStore>) -> Self {
        Self { remote, local }
    }

    /// The deterministic batch for `date`: every caller computes the same
    /// rows, ids included.
    pub fn batch_for(catalog: &Catalog, date: NaiveDate) -> Vec<DailyTaskRow> {
        let templates = catalog.templates();
        if templates.is_empty() {
            return Vec::new();
        }
        let start = date.num_days_from_ce().rem_euclid(templates.len() as i32) as usize;
        (0..DAILY_BATCH_SIZE.min(templates.len()))
            .map(|slot| {
                let template = &templates[(start + slot) % templates.len()];
                DailyTaskRow {
                    id: format!("task-{date}-{slot}"),
                    task_text: template.text.clone(),
                    category: template.category.clone(),
                    points: template.points,
                    task_date: date,
                }
            })
            .collect()
    }

    /// Make sure today's batch exists and return it with completion flags.
    ///
    /// Infallible: if the remote store cannot be reached the generated
    /// batch is served from the deterministic rotation, with completion
    /// state from the local list only.
    pub fn ensure_todays_tasks(
        &self,
        catalog: &Catalog,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Vec<DailyTask> {
        let date = tracker_date(now);
        let rows = self.ensure_rows(catalog, date);
        let completed = self.load_completions(identity, date);

        rows.into_iter()
            .map(|row| DailyTask {
                completed: completed.contains(&row.id),
                id: row.id,
                text: row.task_text,
                category: row.category,
                points: row.points,
            })
            .collect()
    }

    fn ensure_rows(&self, catalog: &Catalog, date: NaiveDate) -> Vec<DailyTaskRow> {
        let existing = match self.remote.fetch_daily_tasks(date) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, %date, "daily task fetch failed, serving generated batch");
                return Self::batch_for(catalog, date);
            }
        };
        if !existing.is_empty() {
            return existing;
        }

        // First opener of the day. Another client may be doing the same
        // thing right now; identical ids make the insert race harmless.
        let batch = Self::batch_for(catalog, date);
        if let Err(e) = self.remote.insert_daily_tasks(&batch) {
            warn!(error = %e, %date, "daily task insert failed, serving generated batch");
            return batch;
        }

        // Refetch so everyone renders the stored rows, whoever won.
        match self.remote.fetch_daily_tasks(date) {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => batch,
            Err(e) => {
                debug!(error = %e, %date, "refetch after insert failed, serving generated batch");
                batch
            }
        }
    }

    fn load_completions(&self, identity: &Identity, date: NaiveDate) -> Vec<String> {
        match identity {
            Identity::Authenticated { user_id } => {
                // The local list may hold completions from degraded writes;
                // they stay visible and are replayed once the remote answers.
                let held = self.read_local_completions(date);
                match self.remote.fetch_completions(user_id, date) {
                    Ok(mut ids) => {
                        self.replay_held_completions(user_id, date, &held, &mut ids);
                        ids
                    }
                    Err(e) => {
                        warn!(error = %e, "completion fetch failed, using held completions");
                        held
                    }
                }
            }
            Identity::Anonymous => self.read_local_completions(date),
        }
    }

    /// Push locally held completions into the remote table. Ids the remote
    /// accepted (or already had) are dropped from the local list; ids that
    /// still fail stay held and visible.
    fn replay_held_completions(
        &self,
        user_id: &str,
        date: NaiveDate,
        held: &[String],
        ids: &mut Vec<String>,
    ) {
        if held.is_empty() {
            return;
        }
        let mut still_held = Vec::new();
        for task_id in held {
            if ids.contains(task_id) {
                continue;
            }
            match self.remote.insert_completion(user_id, task_id, date) {
                Ok(()) => ids.push(task_id.clone()),
                Err(e) => {
                    warn!(error = %e, task_id, "replay of held completion failed");
                    still_held.push(task_id.clone());
                    ids.push(task_id.clone());
                }
            }
        }
        self.write_local_completions(date, &still_held);
    }

    /// Record a completion. Idempotent: completing an already-completed
    /// task changes nothing and reports [`CompleteOutcome::AlreadyCompleted`].
    pub fn complete_task(
        &self,
        identity: &Identity,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> CompleteOutcome {
        let date = tracker_date(now);
        if self.load_completions(identity, date).contains(&task_id.to_string()) {
            return CompleteOutcome::AlreadyCompleted;
        }

        match identity {
            Identity::Authenticated { user_id } => {
                match self.remote.insert_completion(user_id, task_id, date) {
                    Ok(()) => CompleteOutcome::Completed,
                    Err(e) => {
                        warn!(error = %e, task_id, "remote completion failed, holding locally");
                        self.append_local_completion(date, task_id);
                        CompleteOutcome::DegradedLocal
                    }
                }
            }
            Identity::Anonymous => {
                self.append_local_completion(date, task_id);
                CompleteOutcome::Completed
            }
        }
    }

    /// Total bonus points earned from a task list.
    pub fn bonus_points(tasks: &[DailyTask]) -> u32 {
        tasks.iter().filter(|t| t.completed).map(|t| t.points).sum()
    }

    /// Drop date-stamped local completion lists older than the retention
    /// window. Keys whose date suffix does not parse are dropped too.
    pub fn prune_stale_completions(&self, now: DateTime<Utc>, retention_days: u32) {
        let cutoff = tracker_date(now) - chrono::Duration::days(i64::from(retention_days));
        let keys = match self.local.keys_with_prefix(keys::DAILY_COMPLETED_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "completion prune scan failed");
                return;
            }
        };

        for key in keys {
            let suffix = &key[keys::DAILY_COMPLETED_PREFIX.len()..];
            let stale = match suffix.parse::<NaiveDate>() {
                Ok(date) => date < cutoff,
                Err(_) => true,
            };
            if stale {
                if let Err(e) = self.local.remove(&key) {
                    warn!(error = %e, key, "failed to prune completion list");
                }
            }
        }
    }

    fn local_key(date: NaiveDate) -> String {
        format!("{}{date}", keys::DAILY_COMPLETED_PREFIX)
    }

    fn read_local_completions(&self, date: NaiveDate) -> Vec<String> {
        self.local
            .get(&Self::local_key(date))
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default()
    }

    fn append_local_completion(&self, date: NaiveDate, task_id: &str) {
        let mut ids = self.read_local_completions(date);
        if ids.iter().any(|id| id == task_id) {
            return;
        }
        ids.push(task_id.to_string());
        self.write_local_completions(date, &ids);
    }

    fn write_local_completions(&self, date: NaiveDate, ids: &[String]) {
        let key = Self::local_key(date);
        if ids.is_empty() {
            if let Err(e) = self.local.remove(&key) {
                warn!(error = %e, "failed to clear local completion list");
            }
            return;
        }
        match serde_json::to_string(ids) {
            Ok(raw) => {
                if let Err(e) = self.local.set(&key, &raw) {
                    warn!(error = %e, "failed to store local completion");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode local completion list"),
        }
    }
}
