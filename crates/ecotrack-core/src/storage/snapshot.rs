//! The local progress snapshot and its key names.
//!
//! Encodings match the original web client so an upgraded install keeps its
//! data: the completed-goal set is a JSON string array, points a plain
//! integer string, the timestamp RFC 3339.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::catalog::GoalId;
use crate::error::StoreError;
use crate::storage::local::LocalStore;

/// Key names in the local store.
pub mod keys {
    pub const COMPLETED_GOALS: &str = "ecoGoalsCompleted";
    pub const POINTS: &str = "ecoGoalsPoints";
    pub const LAST_UPDATED: &str = "ecoGoalsLastUpdated";
    /// Serialized signed-in session (the "logged in" marker).
    pub const USER_MARKER: &str = "user";
    /// Merge-pending flag set when anonymous progress was stashed at login.
    pub const MERGE_PENDING: &str = "show_merge_prompt";
    /// Prefix for the stashed anonymous snapshot keys.
    pub const TEMP_PREFIX: &str = "temp_";
    /// Prefix for per-date anonymous daily-task completion lists.
    pub const DAILY_COMPLETED_PREFIX: &str = "ecoDailyCompleted-";
}

/// A progress snapshot as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalSnapshot {
    pub completed_goals: BTreeSet<GoalId>,
    pub points: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

impl LocalSnapshot {
    pub fn is_empty(&self) -> bool {
        self.completed_goals.is_empty() && self.points == 0
    }
}

/// Read the snapshot stored under `prefix` + the standard keys.
///
/// Returns `Ok(None)` when no snapshot keys exist at all. Malformed
/// entries degrade to defaults rather than erroring: a corrupt snapshot
/// must never block startup.
pub fn read_with_prefix(
    store: &dyn LocalStore,
    prefix: &str,
) -> Result<Option<LocalSnapshot>, StoreError> {
    let goals_raw = store.get(&format!("{prefix}{}", keys::COMPLETED_GOALS))?;
    let points_raw = store.get(&format!("{prefix}{}", keys::POINTS))?;
    let updated_raw = store.get(&format!("{prefix}{}", keys::LAST_UPDATED))?;

    if goals_raw.is_none() && points_raw.is_none() {
        return Ok(None);
    }

    let completed_goals = goals_raw
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .unwrap_or_default()
        .iter()
        .filter_map(|s| GoalId::parse(s))
        .collect();

    let points = points_raw
        .as_deref()
        .and_then(|raw| raw.parse::<u32>().ok())
        .unwrap_or(0);

    let last_updated = updated_raw
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(LocalSnapshot {
        completed_goals,
        points,
        last_updated,
    }))
}

/// Read the primary (unprefixed) snapshot.
pub fn read(store: &dyn LocalStore) -> Result<Option<LocalSnapshot>, StoreError> {
    read_with_prefix(store, "")
}

/// Write a snapshot under `prefix` + the standard keys.
pub fn write_with_prefix(
    store: &dyn LocalStore,
    prefix: &str,
    snapshot: &LocalSnapshot,
) -> Result<(), StoreError> {
    let goals: Vec<String> = snapshot
        .completed_goals
        .iter()
        .map(|id| id.to_string())
        .collect();
    let encoded = serde_json::to_string(&goals).map_err(|e| StoreError::CorruptValue {
        key: keys::COMPLETED_GOALS.to_string(),
        message: e.to_string(),
    })?;

    store.set(&format!("{prefix}{}", keys::COMPLETED_GOALS), &encoded)?;
    store.set(
        &format!("{prefix}{}", keys::POINTS),
        &snapshot.points.to_string(),
    )?;
    if let Some(ts) = snapshot.last_updated {
        store.set(&format!("{prefix}{}", keys::LAST_UPDATED), &ts.to_rfc3339())?;
    }
    Ok(())
}

/// Write the primary snapshot.
pub fn write(store: &dyn LocalStore, snapshot: &LocalSnapshot) -> Result<(), StoreError> {
    write_with_prefix(store, "", snapshot)
}

/// Remove the snapshot keys under `prefix`.
pub fn clear_with_prefix(store: &dyn LocalStore, prefix: &str) -> Result<(), StoreError> {
    store.remove(&format!("{prefix}{}", keys::COMPLETED_GOALS))?;
    store.remove(&format!("{prefix}{}", keys::POINTS))?;
    store.remove(&format!("{prefix}{}", keys::LAST_UPDATED))?;
    Ok(())
}

/// Remove the primary snapshot keys.
pub fn clear(store: &dyn LocalStore) -> Result<(), StoreError> {
    clear_with_prefix(store, "")
}
