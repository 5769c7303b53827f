//! Top-level tracker facade.
//!
//! Ties the catalog, progress store, persistence adapter, daily task
//! engine and reconciliation engine together behind the operations a
//! front end calls: startup, goal toggling, daily tasks, sign-in/out and
//! the merge flow. Every mutation runs the recompute-then-persist cycle;
//! a save that reports a dead session downgrades the identity to
//! anonymous on the spot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::adapter::{LoadSource, PersistenceAdapter, SaveOutcome};
use crate::auth::{clear_session, AuthProvider, Identity};
use crate::catalog::{Catalog, GoalId};
use crate::daily::{CompleteOutcome, DailyTask, DailyTaskEngine};
use crate::error::AuthError;
use crate::progress::ProgressStore;
use crate::reconcile::{MergeDecision, ReconciliationEngine};
use crate::remote::RemoteStore;
use crate::storage::local::LocalStore;
use crate::storage::snapshot::LocalSnapshot;

/// Result of toggling a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleResult {
    /// The toggle was applied and persisted (possibly degraded).
    Applied {
        completed: bool,
        points: u32,
        save: SaveOutcome,
    },
    /// The goal does not exist in the catalog; nothing changed.
    UnknownGoal,
}

/// Result of completing a daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCompletion {
    pub outcome: CompleteOutcome,
    /// Point total after the completion was folded in.
    pub points: u32,
}

/// The tracker core: one instance per running session.
pub struct Tracker {
    catalog: Catalog,
    identity: Identity,
    store: ProgressStore,
    adapter: PersistenceAdapter,
    daily: DailyTaskEngine,
    reconcile: ReconciliationEngine,
    auth: Arc<dyn AuthProvider>,
    local: Arc<dyn LocalStore>,
    retention_days: u32,
}

impl Tracker {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        auth: Arc<dyn AuthProvider>,
        retention_days: u32,
    ) -> Self {
        Self {
            catalog: Catalog::standard(),
            identity: Identity::Anonymous,
            store: ProgressStore::new(),
            adapter: PersistenceAdapter::new(
                Arc::clone(&remote),
                Arc::clone(&local),
                Arc::clone(&auth),
            ),
            daily: DailyTaskEngine::new(remote, Arc::clone(&local)),
            reconcile: ReconciliationEngine::new(Arc::clone(&local)),
            auth,
            local,
            retention_days,
        }
    }

    /// Bring the session up: sweep stale markers, adopt the stored
    /// identity, prune old completion lists and load progress.
    pub fn startup(&mut self, now: DateTime<Utc>) -> LoadSource {
        self.reconcile.sweep_stale_session();
        self.identity = self.auth.current_user().unwrap_or(Identity::Anonymous);
        self.daily.prune_stale_completions(now, self.retention_days);

        let loaded = self.adapter.load_progress(&self.identity);
        let source = loaded.source;
        self.store = ProgressStore::from_loaded(loaded.completed_goals, loaded.points);
        self.refresh_daily_bonus(now);
        info!(identity = self.identity.key(), ?source, "tracker started");
        source
    }

    /// Flip a goal's completion and persist the result.
    pub fn toggle_goal(&mut self, category: &str, text: &str) -> ToggleResult {
        let id = GoalId::new(category, text);
        let Some(completed) = self.store.toggle(&self.catalog, &id) else {
            return ToggleResult::UnknownGoal;
        };

        let save = self.save();
        ToggleResult::Applied {
            completed,
            points: self.store.points(),
            save,
        }
    }

    /// Today's task batch with completion flags; also folds the earned
    /// bonus into the point total.
    pub fn ensure_todays_tasks(&mut self, now: DateTime<Utc>) -> Vec<DailyTask> {
        self.refresh_daily_bonus(now)
    }

    /// Complete a daily task and persist the updated total.
    pub fn complete_task(&mut self, task_id: &str, now: DateTime<Utc>) -> TaskCompletion {
        let outcome = self.daily.complete_task(&self.identity, task_id, now);
        self.refresh_daily_bonus(now);
        if outcome != CompleteOutcome::AlreadyCompleted {
            self.save();
        }
        TaskCompletion {
            outcome,
            points: self.store.points(),
        }
    }

    /// Sign in. On success any anonymous progress is stashed for the
    /// merge prompt and the account's progress is loaded.
    ///
    /// Returns `true` when a merge decision is now pending.
    ///
    /// # Errors
    /// Returns the auth error when the credentials are rejected or the
    /// endpoint cannot be reached; local state is untouched in that case.
    pub fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let session = self.auth.sign_in(email, password)?;
        let pending = self.begin_merge_flow();
        self.identity = Identity::Authenticated {
            user_id: session.user_id,
        };

        let loaded = self.adapter.load_progress(&self.identity);
        self.store = ProgressStore::from_loaded(loaded.completed_goals, loaded.points);
        self.refresh_daily_bonus(now);
        Ok(pending)
    }

    /// Create an account. The caller signs in separately afterwards.
    ///
    /// # Errors
    /// Returns the auth error when the endpoint rejects the signup.
    pub fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.auth.sign_up(email, password)
    }

    /// Stash anonymous progress ahead of adopting a signed-in identity.
    /// Returns `true` when a merge decision is now pending.
    pub fn begin_merge_flow(&self) -> bool {
        self.reconcile.stash_anonymous_progress()
    }

    /// The stashed anonymous snapshot awaiting a merge decision, if any.
    pub fn pending_merge(&self) -> Option<LocalSnapshot> {
        self.reconcile.pending_merge()
    }

    /// Apply the merge decision and persist the result.
    pub fn resolve_merge(&mut self, decision: MergeDecision) -> SaveOutcome {
        let absorbed = self.reconcile.resolve(decision);
        self.store.absorb(absorbed);
        self.save()
    }

    /// Sign out and clear all local progress state.
    pub fn logout(&mut self, _now: DateTime<Utc>) {
        if let Err(e) = self.auth.sign_out() {
            warn!(error = %e, "remote sign-out failed");
        }
        self.reconcile.clear_local_progress();
        self.store.reset(&self.catalog);
        self.identity = Identity::Anonymous;
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn points(&self) -> u32 {
        self.store.points()
    }

    pub fn progress_percent(&self) -> u8 {
        self.store.progress_percent(&self.catalog)
    }

    pub fn is_completed(&self, category: &str, text: &str) -> bool {
        self.store.is_completed(&GoalId::new(category, text))
    }

    pub fn completed_in_category(&self, category_id: &str) -> usize {
        self.store.completed_in_category(&self.catalog, category_id)
    }

    fn refresh_daily_bonus(&mut self, now: DateTime<Utc>) -> Vec<DailyTask> {
        let tasks = self
            .daily
            .ensure_todays_tasks(&self.catalog, &self.identity, now);
        self.store.set_daily_bonus(DailyTaskEngine::bonus_points(&tasks));
        self.store.recompute_points(&self.catalog);
        tasks
    }

    fn save(&mut self) -> SaveOutcome {
        let outcome = self
            .adapter
            .save_progress(&self.identity, &mut self.store, &self.catalog);
        if outcome == SaveOutcome::SessionEnded {
            // The session is gone for good; keep working anonymously so
            // nothing typed this session is lost.
            warn!("session ended, continuing in anonymous mode");
            clear_session(self.local.as_ref());
            self.identity = Identity::Anonymous;
        }
        outcome
    }
}
