//! Shared CLI plumbing: tracker construction from configuration.

use std::sync::Arc;

use chrono::Utc;
use ecotrack_core::auth::{AuthProvider, Identity, RefreshOutcome, StoredSession};
use ecotrack_core::error::AuthError;
use ecotrack_core::remote::{MemoryRemote, RemoteStore};
use ecotrack_core::storage::local::LocalStore;
use ecotrack_core::{Config, SqliteStore, SupabaseAuth, SupabaseStore, Tracker};

/// Auth provider for local-only mode (no backend configured).
struct OfflineAuth;

impl AuthProvider for OfflineAuth {
    fn current_user(&self) -> Option<Identity> {
        None
    }

    fn sign_in(&self, _email: &str, _password: &str) -> Result<StoredSession, AuthError> {
        Err(AuthError::RequestFailed(
            "no backend configured; run `ecotrack-cli config set-backend` first".into(),
        ))
    }

    fn sign_up(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
        Err(AuthError::RequestFailed(
            "no backend configured; run `ecotrack-cli config set-backend` first".into(),
        ))
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    fn refresh_session(&self) -> RefreshOutcome {
        RefreshOutcome::Ended
    }
}

/// Build a tracker from the on-disk configuration and run its startup
/// sequence. Without a configured backend the tracker runs local-only.
pub fn build_tracker() -> Result<Tracker, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let local: Arc<dyn LocalStore> = Arc::new(SqliteStore::open_default()?);

    let (remote, auth): (Arc<dyn RemoteStore>, Arc<dyn AuthProvider>) = if config.has_backend() {
        let remote = SupabaseStore::new(
            &config.backend.url,
            &config.backend.anon_key,
            Arc::clone(&local),
        )?;
        let auth = SupabaseAuth::new(
            &config.backend.url,
            &config.backend.anon_key,
            Arc::clone(&local),
        )?;
        (Arc::new(remote), Arc::new(auth))
    } else {
        (Arc::new(MemoryRemote::new()), Arc::new(OfflineAuth))
    };

    let mut tracker = Tracker::new(
        remote,
        local,
        auth,
        config.retention.completion_retention_days,
    );
    tracker.startup(Utc::now());
    Ok(tracker)
}
