//! In-memory remote store.
//!
//! Stands in for the REST backend when no backend is configured (local-only
//! mode) and backs the test suite, including fault injection for the
//! fallback and refresh-retry paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::remote::types::{DailyTaskRow, ProgressRecord, RemoteError, RemoteStore};

/// Error kinds that can be injected into the next operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedError {
    SessionInvalid,
    Transient,
}

#[derive(Default)]
struct Inner {
    progress: HashMap<String, ProgressRecord>,
    tasks: HashMap<NaiveDate, Vec<DailyTaskRow>>,
    completions: HashSet<(String, String, NaiveDate)>,
    injected: VecDeque<InjectedError>,
}

/// In-memory [`RemoteStore`].
#[derive(Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error for the next operation (consumed in FIFO order).
    pub fn inject_error(&self, error: InjectedError) {
        self.lock().injected.push_back(error);
    }

    /// Number of stored completion links (for assertions).
    pub fn completion_count(&self) -> usize {
        self.lock().completions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_injected(inner: &mut Inner) -> Result<(), RemoteError> {
        match inner.injected.pop_front() {
            Some(InjectedError::SessionInvalid) => {
                Err(RemoteError::SessionInvalid("injected".into()))
            }
            Some(InjectedError::Transient) => Err(RemoteError::Transient("injected".into())),
            None => Ok(()),
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch_progress(&self, user_id: &str) -> Result<ProgressRecord, RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        inner
            .progress
            .get(user_id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        inner
            .progress
            .insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn fetch_daily_tasks(&self, date: NaiveDate) -> Result<Vec<DailyTaskRow>, RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        Ok(inner.tasks.get(&date).cloned().unwrap_or_default())
    }

    fn insert_daily_tasks(&self, rows: &[DailyTaskRow]) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        for row in rows {
            let existing = inner.tasks.entry(row.task_date).or_default();
            // Primary-key collision: keep the first writer's row.
            if !existing.iter().any(|t| t.id == row.id) {
                existing.push(row.clone());
            }
        }
        Ok(())
    }

    fn fetch_completions(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        let mut ids: Vec<String> = inner
            .completions
            .iter()
            .filter(|(u, _, d)| u == user_id && *d == date)
            .map(|(_, task_id, _)| task_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn insert_completion(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        Self::take_injected(&mut inner)?;
        inner
            .completions
            .insert((user_id.to_string(), task_id.to_string(), date));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date")
    }

    #[test]
    fn fetch_missing_progress_is_not_found() {
        let remote = MemoryRemote::new();
        assert!(matches!(
            remote.fetch_progress("u-1"),
            Err(RemoteError::NotFound)
        ));
    }

    #[test]
    fn upsert_then_fetch() {
        let remote = MemoryRemote::new();
        let record = ProgressRecord {
            user_id: "u-1".into(),
            completed_goals: vec!["water-Kompost yapmak".into()],
            points: 20,
            last_updated: Utc::now(),
        };
        remote.upsert_progress(&record).unwrap();
        assert_eq!(remote.fetch_progress("u-1").unwrap().points, 20);
    }

    #[test]
    fn duplicate_task_rows_are_ignored() {
        let remote = MemoryRemote::new();
        let row = DailyTaskRow {
            id: "task-2026-08-30-0".into(),
            task_text: "Toplu taşıma kullanmak".into(),
            category: "transport".into(),
            points: 10,
            task_date: date(),
        };
        remote.insert_daily_tasks(&[row.clone()]).unwrap();
        remote.insert_daily_tasks(&[row]).unwrap();
        assert_eq!(remote.fetch_daily_tasks(date()).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_completion_is_single_link() {
        let remote = MemoryRemote::new();
        remote.insert_completion("u-1", "t-1", date()).unwrap();
        remote.insert_completion("u-1", "t-1", date()).unwrap();
        assert_eq!(remote.completion_count(), 1);
        assert_eq!(remote.fetch_completions("u-1", date()).unwrap().len(), 1);
    }

    #[test]
    fn injected_errors_fire_once_in_order() {
        let remote = MemoryRemote::new();
        remote.inject_error(InjectedError::Transient);
        assert!(matches!(
            remote.fetch_progress("u-1"),
            Err(RemoteError::Transient(_))
        ));
        // Next call sees the real (empty) state.
        assert!(matches!(
            remote.fetch_progress("u-1"),
            Err(RemoteError::NotFound)
        ));
    }
}
