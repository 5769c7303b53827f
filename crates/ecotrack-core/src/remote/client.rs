//! Supabase REST (PostgREST) implementation of the remote store.
//!
//! Three logical tables: `user_progress` (one row per identity),
//! `global_daily_tasks` (shared rows keyed by date) and
//! `daily_task_completions` (per-identity completion links). Requests are
//! driven from sync code through a crate-owned current-thread runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use tokio::runtime::Runtime;

use crate::auth::read_session;
use crate::remote::types::{
    classify_status, classify_transport, DailyTaskRow, ProgressRecord, RemoteError, RemoteStore,
};
use crate::storage::local::LocalStore;

/// PostgREST client for the progress and daily-task tables.
pub struct SupabaseStore {
    base_url: String,
    anon_key: String,
    /// Source of the signed-in bearer token (the `user` marker); the anon
    /// key is used when nobody is signed in.
    local: Arc<dyn LocalStore>,
    http: reqwest::Client,
    rt: Runtime,
}

impl SupabaseStore {
    /// # Errors
    /// Returns an error if the internal runtime cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        local: Arc<dyn LocalStore>,
    ) -> Result<Self, std::io::Error> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            local,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            rt,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn bearer(&self) -> String {
        read_session(self.local.as_ref())
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn get_rows(&self, url: &str) -> Result<Vec<serde_json::Value>, RemoteError> {
        let request = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer());

        let (status, body) = self
            .rt
            .block_on(async {
                let resp = request.send().await?;
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                Ok::<_, reqwest::Error>((status, body))
            })
            .map_err(|e| classify_transport(&e))?;

        if status >= 400 {
            return Err(classify_status(status, &body));
        }
        serde_json::from_str::<Vec<serde_json::Value>>(&body)
            .map_err(|e| RemoteError::Transient(format!("malformed response: {e}")))
    }

    /// POST rows with a PostgREST `Prefer` resolution, so the same call
    /// serves both upsert (merge) and race-tolerant insert (ignore).
    fn post_rows(
        &self,
        table: &str,
        body: serde_json::Value,
        resolution: &str,
    ) -> Result<(), RemoteError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.anon_key)
            .header("Prefer", format!("resolution={resolution}"))
            .bearer_auth(self.bearer())
            .json(&body);

        let (status, text) = self
            .rt
            .block_on(async {
                let resp = request.send().await?;
                let status = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                Ok::<_, reqwest::Error>((status, text))
            })
            .map_err(|e| classify_transport(&e))?;

        if status >= 400 {
            return Err(classify_status(status, &text));
        }
        Ok(())
    }
}

impl RemoteStore for SupabaseStore {
    fn fetch_progress(&self, user_id: &str) -> Result<ProgressRecord, RemoteError> {
        let url = format!(
            "{}?user_id=eq.{user_id}&select=*",
            self.table_url("user_progress")
        );
        let rows = self.get_rows(&url)?;
        let row = rows.into_iter().next().ok_or(RemoteError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| RemoteError::Transient(format!("malformed user_progress row: {e}")))
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), RemoteError> {
        let body = serde_json::to_value(vec![record])
            .map_err(|e| RemoteError::Transient(e.to_string()))?;
        self.post_rows("user_progress", body, "merge-duplicates")
    }

    fn fetch_daily_tasks(&self, date: NaiveDate) -> Result<Vec<DailyTaskRow>, RemoteError> {
        let url = format!(
            "{}?task_date=eq.{date}&select=*&order=id",
            self.table_url("global_daily_tasks")
        );
        let rows = self.get_rows(&url)?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| RemoteError::Transient(format!("malformed task row: {e}")))
            })
            .collect()
    }

    fn insert_daily_tasks(&self, tasks: &[DailyTaskRow]) -> Result<(), RemoteError> {
        let body =
            serde_json::to_value(tasks).map_err(|e| RemoteError::Transient(e.to_string()))?;
        self.post_rows("global_daily_tasks", body, "ignore-duplicates")
    }

    fn fetch_completions(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, RemoteError> {
        let url = format!(
            "{}?user_id=eq.{user_id}&task_date=eq.{date}&select=task_id",
            self.table_url("daily_task_completions")
        );
        let rows = self.get_rows(&url)?;
        Ok(rows
            .iter()
            .filter_map(|row| row["task_id"].as_str().map(|s| s.to_string()))
            .collect())
    }

    fn insert_completion(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), RemoteError> {
        let body = json!([{
            "user_id": user_id,
            "task_id": task_id,
            "task_date": date,
        }]);
        self.post_rows("daily_task_completions", body, "ignore-duplicates")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local::MemoryStore;
    use chrono::Utc;

    fn store_for(server: &mockito::ServerGuard) -> SupabaseStore {
        SupabaseStore::new(server.url(), "anon-key", Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn fetch_progress_parses_row() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/user_progress?user_id=eq.u-1&select=*")
            .with_status(200)
            .with_body(
                r#"[{"user_id":"u-1",
                     "completed_goals":["water-Kompost yapmak"],
                     "points":20,
                     "last_updated":"2026-08-30T10:00:00Z"}]"#,
            )
            .create();

        let record = store_for(&server).fetch_progress("u-1").unwrap();
        assert_eq!(record.points, 20);
        assert_eq!(record.completed_goals.len(), 1);
    }

    #[test]
    fn fetch_progress_empty_result_is_not_found() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/user_progress?user_id=eq.u-1&select=*")
            .with_status(200)
            .with_body("[]")
            .create();

        let err = store_for(&server).fetch_progress("u-1").unwrap_err();
        assert!(matches!(err, RemoteError::NotFound));
    }

    #[test]
    fn expired_token_classifies_as_session_invalid() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/user_progress?user_id=eq.u-1&select=*")
            .with_status(401)
            .with_body(r#"{"message":"JWT expired"}"#)
            .create();

        let err = store_for(&server).fetch_progress("u-1").unwrap_err();
        assert!(matches!(err, RemoteError::SessionInvalid(_)));
    }

    #[test]
    fn server_error_classifies_as_transient() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/user_progress?user_id=eq.u-1&select=*")
            .with_status(500)
            .with_body("boom")
            .create();

        let err = store_for(&server).fetch_progress("u-1").unwrap_err();
        assert!(matches!(err, RemoteError::Transient(_)));
    }

    #[test]
    fn unreachable_host_is_transient() {
        let store = SupabaseStore::new(
            "http://127.0.0.1:1",
            "anon-key",
            Arc::new(MemoryStore::new()),
        )
        .unwrap();
        let err = store.fetch_progress("u-1").unwrap_err();
        assert!(matches!(err, RemoteError::Transient(_)));
    }

    #[test]
    fn upsert_progress_sends_merge_duplicates() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/v1/user_progress")
            .match_header("Prefer", "resolution=merge-duplicates")
            .with_status(201)
            .create();

        let record = ProgressRecord {
            user_id: "u-1".into(),
            completed_goals: vec![],
            points: 0,
            last_updated: Utc::now(),
        };
        store_for(&server).upsert_progress(&record).unwrap();
        mock.assert();
    }

    #[test]
    fn insert_completion_ignores_duplicates() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/v1/daily_task_completions")
            .match_header("Prefer", "resolution=ignore-duplicates")
            .with_status(201)
            .create();

        let date = NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date");
        store_for(&server)
            .insert_completion("u-1", "task-2026-08-30-0", date)
            .unwrap();
        mock.assert();
    }

    #[test]
    fn fetch_completions_extracts_task_ids() {
        let mut server = mockito::Server::new();
        server
            .mock(
                "GET",
                "/rest/v1/daily_task_completions?user_id=eq.u-1&task_date=eq.2026-08-30&select=task_id",
            )
            .with_status(200)
            .with_body(r#"[{"task_id":"task-2026-08-30-1"}]"#)
            .create();

        let date = NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date");
        let ids = store_for(&server).fetch_completions("u-1", date).unwrap();
        assert_eq!(ids, vec!["task-2026-08-30-1".to_string()]);
    }
}
