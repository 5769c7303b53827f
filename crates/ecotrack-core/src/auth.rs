//! Authentication collaborator boundary.
//!
//! The core consumes a small surface: who is signed in, sign-in/out, and a
//! single-shot session refresh. [`SupabaseAuth`] implements it against the
//! GoTrue endpoints; the signed-in session is serialized into the local
//! key-value store under the `user` marker, where the stale-session sweep
//! and the REST client also find it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::storage::local::LocalStore;
use crate::storage::snapshot::keys;

/// Who the current operations run as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No account; progress persists only to local storage.
    Anonymous,
    /// Signed-in user with a persistent id.
    Authenticated { user_id: String },
}

impl Identity {
    /// Storage key for this identity ("local" for anonymous).
    pub fn key(&self) -> &str {
        match self {
            Identity::Anonymous => "local",
            Identity::Authenticated { user_id } => user_id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }
}

/// Outcome of a session-refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens were obtained; the failed call may be retried once.
    Refreshed,
    /// The session could not be recovered; the identity is logged out.
    Ended,
}

/// The serialized signed-in session (the "logged in" marker value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Read the session marker. Missing or corrupt markers read as `None`;
/// the stale-session sweep treats marker-without-session as grounds to
/// clear local progress.
pub fn read_session(store: &dyn LocalStore) -> Option<StoredSession> {
    let raw = store.get(keys::USER_MARKER).ok().flatten()?;
    serde_json::from_str(&raw).ok()
}

pub fn write_session(store: &dyn LocalStore, session: &StoredSession) {
    match serde_json::to_string(session) {
        Ok(raw) => {
            if let Err(e) = store.set(keys::USER_MARKER, &raw) {
                warn!(error = %e, "failed to persist session marker");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize session marker"),
    }
}

pub fn clear_session(store: &dyn LocalStore) {
    if let Err(e) = store.remove(keys::USER_MARKER) {
        warn!(error = %e, "failed to clear session marker");
    }
}

/// Authentication provider consumed by the core.
pub trait AuthProvider: Send + Sync {
    /// Current identity, or `None` when no corroborated session exists.
    fn current_user(&self) -> Option<Identity>;

    fn sign_in(&self, email: &str, password: &str) -> Result<StoredSession, AuthError>;

    fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// Try to refresh the session once. Never retries internally.
    fn refresh_session(&self) -> RefreshOutcome;
}

/// GoTrue (Supabase auth) implementation of [`AuthProvider`].
pub struct SupabaseAuth {
    base_url: String,
    anon_key: String,
    local: Arc<dyn LocalStore>,
    http: reqwest::Client,
    rt: Runtime,
}

impl SupabaseAuth {
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

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<(u16, serde_json::Value), AuthError> {
        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body);
        self.rt
            .block_on(async {
                let resp = request.send().await?;
                let status = resp.status().as_u16();
                let value = resp.json::<serde_json::Value>().await.unwrap_or(json!({}));
                Ok::<_, reqwest::Error>((status, value))
            })
            .map_err(|e| AuthError::RequestFailed(e.to_string()))
    }

    fn session_from_token_response(body: &serde_json::Value) -> Result<StoredSession, AuthError> {
        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| AuthError::RequestFailed("missing access_token".into()))?;
        let refresh_token = body["refresh_token"].as_str().unwrap_or_default();
        let user_id = body["user"]["id"]
            .as_str()
            .ok_or_else(|| AuthError::RequestFailed("missing user id".into()))?;
        let email = body["user"]["email"].as_str().unwrap_or_default();

        Ok(StoredSession {
            user_id: user_id.to_string(),
            email: email.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }
}

impl AuthProvider for SupabaseAuth {
    fn current_user(&self) -> Option<Identity> {
        read_session(self.local.as_ref()).map(|s| Identity::Authenticated { user_id: s.user_id })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<StoredSession, AuthError> {
        let url = self.auth_url("token?grant_type=password");
        let (status, body) =
            self.post_json(&url, json!({ "email": email, "password": password }))?;

        if status == 400 || status == 401 {
            let msg = body["error_description"]
                .as_str()
                .or_else(|| body["msg"].as_str())
                .unwrap_or("invalid login")
                .to_string();
            return Err(AuthError::InvalidCredentials(msg));
        }
        if status >= 400 {
            return Err(AuthError::RequestFailed(format!("HTTP {status}")));
        }

        let session = Self::session_from_token_response(&body)?;
        write_session(self.local.as_ref(), &session);
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = self.auth_url("signup");
        let (status, body) =
            self.post_json(&url, json!({ "email": email, "password": password }))?;
        if status >= 400 {
            let msg = body["msg"].as_str().unwrap_or("signup rejected").to_string();
            return Err(AuthError::RequestFailed(msg));
        }
        Ok(())
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = read_session(self.local.as_ref()) {
            let url = self.auth_url("logout");
            let request = self
                .http
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token);
            // Best effort: the server-side session may already be gone.
            if let Err(e) = self.rt.block_on(request.send()) {
                debug!(error = %e, "remote sign-out failed, clearing local session anyway");
            }
        }
        clear_session(self.local.as_ref());
        Ok(())
    }

    fn refresh_session(&self) -> RefreshOutcome {
        let Some(session) = read_session(self.local.as_ref()) else {
            return RefreshOutcome::Ended;
        };
        if session.refresh_token.is_empty() {
            return RefreshOutcome::Ended;
        }

        let url = self.auth_url("token?grant_type=refresh_token");
        let response = self.post_json(&url, json!({ "refresh_token": session.refresh_token }));
        match response {
            Ok((status, body)) if status < 400 => {
                match Self::session_from_token_response(&body) {
                    Ok(refreshed) => {
                        write_session(self.local.as_ref(), &refreshed);
                        RefreshOutcome::Refreshed
                    }
                    Err(e) => {
                        warn!(error = %e, "refresh response missing tokens");
                        RefreshOutcome::Ended
                    }
                }
            }
            Ok((status, _)) => {
                debug!(status, "session refresh rejected");
                RefreshOutcome::Ended
            }
            Err(e) => {
                warn!(error = %e, "session refresh request failed");
                RefreshOutcome::Ended
            }
        }
    }
}
