//! Dual-backend persistence: remote record vs. local snapshot.
//!
//! Load is an explicit ordered chain of providers (remote, then local, then
//! defaults); each provider reports loaded / authoritatively-absent /
//! failed, and the chain stops on the first non-failure. Save writes the
//! local snapshot first as the durability backstop, then upserts the remote
//! record for authenticated identities with at most one refresh-and-retry.
//!
//! All remote errors are absorbed here; callers always get a renderable
//! state and an outcome they can surface.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::auth::{AuthProvider, Identity, RefreshOutcome};
use crate::catalog::{Catalog, GoalId};
use crate::progress::ProgressStore;
use crate::remote::{ProgressRecord, RemoteError, RemoteStore};
use crate::storage::local::LocalStore;
use crate::storage::snapshot::{self, LocalSnapshot};

/// Where a load ultimately got its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
    Defaults,
}

/// Result of a load: always valid, never an error.
#[derive(Debug, Clone)]
pub struct LoadedProgress {
    pub completed_goals: BTreeSet<GoalId>,
    pub points: u32,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: LoadSource,
}

impl LoadedProgress {
    fn defaults() -> Self {
        Self {
            completed_goals: BTreeSet::new(),
            points: 0,
            last_updated: None,
            source: LoadSource::Defaults,
        }
    }
}

/// One provider's answer in the load chain.
enum ProviderOutcome {
    /// Data found; stop the chain.
    Loaded(LoadedProgress),
    /// Store reachable and authoritatively empty; stop with fresh defaults.
    Absent,
    /// Store unreachable or rejected the call; try the next provider.
    Failed,
}

/// Outcome of a save, from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Every applicable backend accepted the write.
    Saved,
    /// The remote write failed transiently; the local snapshot holds the
    /// data. Degraded success, not a failure.
    DegradedLocalOnly,
    /// No backend accepted the write; the in-memory state is the only
    /// copy left.
    NotPersisted,
    /// The session could not be refreshed; the identity should be treated
    /// as logged out.
    SessionEnded,
}

/// Read/write layer over the remote record and the local snapshot.
pub struct PersistenceAdapter {
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
    auth: Arc<dyn AuthProvider>,
}

impl PersistenceAdapter {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            remote,
            local,
            auth,
        }
    }

    /// Load progress for `identity`. Infallible: the chain ends in
    /// defaults, and provider failures only move it along.
    pub fn load_progress(&self, identity: &Identity) -> LoadedProgress {
        let outcomes: Vec<ProviderOutcome> = match identity {
            Identity::Authenticated { user_id } => {
                // Remote first; the local snapshot is only a fallback when
                // the remote store cannot answer at all.
                let remote = self.remote_provider(user_id);
                if matches!(remote, ProviderOutcome::Failed) {
                    vec![remote, self.local_provider()]
                } else {
                    vec![remote]
                }
            }
            Identity::Anonymous => vec![self.local_provider()],
        };

        for outcome in outcomes {
            match outcome {
                ProviderOutcome::Loaded(loaded) => return loaded,
                ProviderOutcome::Absent => return LoadedProgress::defaults(),
                ProviderOutcome::Failed => continue,
            }
        }
        LoadedProgress::defaults()
    }

    fn remote_provider(&self, user_id: &str) -> ProviderOutcome {
        match self.remote.fetch_progress(user_id) {
            Ok(record) => ProviderOutcome::Loaded(LoadedProgress {
                completed_goals: record
                    .completed_goals
                    .iter()
                    .filter_map(|s| GoalId::parse(s))
                    .collect(),
                points: record.points,
                last_updated: Some(record.last_updated),
                source: LoadSource::Remote,
            }),
            // First save hasn't happened yet: fresh state, not an error.
            Err(RemoteError::NotFound) => ProviderOutcome::Absent,
            Err(e) => {
                warn!(error = %e, "remote load failed, falling back to local snapshot");
                ProviderOutcome::Failed
            }
        }
    }

    fn local_provider(&self) -> ProviderOutcome {
        match snapshot::read(self.local.as_ref()) {
            Ok(Some(snap)) => ProviderOutcome::Loaded(LoadedProgress {
                completed_goals: snap.completed_goals,
                points: snap.points,
                last_updated: snap.last_updated,
                source: LoadSource::Local,
            }),
            Ok(None) => ProviderOutcome::Absent,
            Err(e) => {
                warn!(error = %e, "local snapshot read failed");
                ProviderOutcome::Failed
            }
        }
    }

    /// Persist the store's state for `identity`.
    ///
    /// The point total is recomputed here, never passed through; the local
    /// snapshot is written first so a remote failure can not lose data.
    pub fn save_progress(
        &self,
        identity: &Identity,
        store: &mut ProgressStore,
        catalog: &Catalog,
    ) -> SaveOutcome {
        let points = store.recompute_points(catalog);
        let now = Utc::now();

        let snap = LocalSnapshot {
            completed_goals: store.completed().clone(),
            points,
            last_updated: Some(now),
        };
        let local_ok = match snapshot::write(self.local.as_ref(), &snap) {
            Ok(()) => true,
            Err(e) => {
                // The remote write below may still succeed; nothing to unwind.
                warn!(error = %e, "local snapshot write failed");
                false
            }
        };

        let Identity::Authenticated { user_id } = identity else {
            return if local_ok {
                SaveOutcome::Saved
            } else {
                SaveOutcome::NotPersisted
            };
        };

        let record = ProgressRecord {
            user_id: user_id.clone(),
            completed_goals: snap.completed_goals.iter().map(|id| id.to_string()).collect(),
            points,
            last_updated: now,
        };

        // Bounded loop: the second pass only exists after one successful
        // refresh, so there is exactly one retry and no recursion.
        let mut refreshed = false;
        loop {
            match self.remote.upsert_progress(&record) {
                Ok(()) => return SaveOutcome::Saved,
                Err(RemoteError::SessionInvalid(reason)) => {
                    if refreshed {
                        debug!(reason, "remote write rejected again after refresh");
                        return SaveOutcome::SessionEnded;
                    }
                    match self.auth.refresh_session() {
                        RefreshOutcome::Refreshed => {
                            refreshed = true;
                        }
                        RefreshOutcome::Ended => return SaveOutcome::SessionEnded,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "remote save failed");
                    return if local_ok {
                        SaveOutcome::DegradedLocalOnly
                    } else {
                        SaveOutcome::NotPersisted
                    };
                }
            }
        }
    }
}
