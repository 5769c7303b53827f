//! Anonymous-to-account progress reconciliation.
//!
//! Signing in while anonymous progress exists raises a conflict the user
//! must resolve. The anonymous snapshot is moved into a `temp_`-prefixed
//! holding area, the primary keys are cleared so the account's remote
//! state can load cleanly, and a pending flag marks the open decision.
//! Resolution either merges the stash into the account's progress or
//! discards it; both paths drain the holding area.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::read_session;
use crate::catalog::GoalId;
use crate::storage::local::LocalStore;
use crate::storage::snapshot::{self, keys, LocalSnapshot};

/// The user's answer to the merge prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Union the stashed anonymous goals into the account's progress.
    Merge,
    /// Drop the anonymous progress; the account's state stands alone.
    Discard,
}

/// Moves anonymous progress through the stash-prompt-resolve cycle.
pub struct ReconciliationEngine {
    local: Arc<dyn LocalStore>,
}

impl ReconciliationEngine {
    pub fn new(local: Arc<dyn LocalStore>) -> Self {
        Self { local }
    }

    /// Stash the anonymous snapshot and raise the merge-pending flag.
    ///
    /// Returns `true` when a decision is now pending. An empty or missing
    /// snapshot stashes nothing; there is no conflict to resolve.
    pub fn stash_anonymous_progress(&self) -> bool {
        let snap = match snapshot::read(self.local.as_ref()) {
            Ok(Some(snap)) if !snap.is_empty() => snap,
            Ok(_) => return false,
            Err(e) => {
                warn!(error = %e, "could not read anonymous progress, skipping stash");
                return false;
            }
        };

        if let Err(e) = snapshot::write_with_prefix(self.local.as_ref(), keys::TEMP_PREFIX, &snap) {
            warn!(error = %e, "failed to stash anonymous progress");
            return false;
        }
        // Primary keys go away so the account's state loads without the
        // anonymous data shadowing it.
        if let Err(e) = snapshot::clear(self.local.as_ref()) {
            warn!(error = %e, "failed to clear primary snapshot after stash");
        }
        if let Err(e) = self.local.set(keys::MERGE_PENDING, "true") {
            warn!(error = %e, "failed to set merge-pending flag");
        }
        info!(goals = snap.completed_goals.len(), "anonymous progress stashed for merge");
        true
    }

    /// The stashed snapshot awaiting a decision, if any.
    pub fn pending_merge(&self) -> Option<LocalSnapshot> {
        let flag = self.local.get(keys::MERGE_PENDING).ok().flatten()?;
        if flag != "true" {
            return None;
        }
        match snapshot::read_with_prefix(self.local.as_ref(), keys::TEMP_PREFIX) {
            Ok(Some(snap)) => Some(snap),
            // Flag without a stash is leftover state; clean it up.
            Ok(None) => {
                self.drain();
                None
            }
            Err(e) => {
                warn!(error = %e, "could not read stashed progress");
                None
            }
        }
    }

    /// Apply the user's decision and drain the holding area.
    ///
    /// Returns the goal ids to union into the account's progress; empty
    /// for [`MergeDecision::Discard`] or when nothing was pending.
    pub fn resolve(&self, decision: MergeDecision) -> BTreeSet<GoalId> {
        let stashed = self.pending_merge();
        self.drain();

        match (decision, stashed) {
            (MergeDecision::Merge, Some(snap)) => {
                info!(goals = snap.completed_goals.len(), "merging anonymous progress");
                snap.completed_goals
            }
            (MergeDecision::Discard, Some(_)) => {
                info!("anonymous progress discarded");
                BTreeSet::new()
            }
            (_, None) => BTreeSet::new(),
        }
    }

    /// Remove local progress left by a session that no longer exists.
    ///
    /// A `user` marker that does not decode to a session means a previous
    /// signed-in run ended abnormally; its progress keys must not leak
    /// into the next anonymous or signed-in session.
    pub fn sweep_stale_session(&self) {
        let marker = self.local.get(keys::USER_MARKER).ok().flatten();
        if marker.is_none() || read_session(self.local.as_ref()).is_some() {
            return;
        }

        info!("stale session marker found, clearing local progress");
        self.clear_local_progress();
        if let Err(e) = self.local.remove(keys::USER_MARKER) {
            warn!(error = %e, "failed to remove stale session marker");
        }
    }

    /// Clear the primary snapshot, any stashed state and the local
    /// daily-completion lists (logout path).
    pub fn clear_local_progress(&self) {
        if let Err(e) = snapshot::clear(self.local.as_ref()) {
            warn!(error = %e, "failed to clear snapshot on logout");
        }
        match self.local.keys_with_prefix(keys::DAILY_COMPLETED_PREFIX) {
            Ok(completion_keys) => {
                for key in completion_keys {
                    if let Err(e) = self.local.remove(&key) {
                        warn!(error = %e, key, "failed to clear completion list");
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to scan completion lists"),
        }
        self.drain();
    }

    fn drain(&self) {
        if let Err(e) = snapshot::clear_with_prefix(self.local.as_ref(), keys::TEMP_PREFIX) {
            warn!(error = %e, "failed to clear stashed snapshot");
        }
        if let Err(e) = self.local.remove(keys::MERGE_PENDING) {
            warn!(error = %e, "failed to clear merge-pending flag");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{write_session, StoredSession};
    use crate::storage::local::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, ReconciliationEngine) {
        let local = Arc::new(MemoryStore::new());
        let engine = ReconciliationEngine::new(Arc::clone(&local) as Arc<dyn LocalStore>);
        (local, engine)
    }

    fn anonymous_snapshot() -> LocalSnapshot {
        let mut completed = BTreeSet::new();
        completed.insert(GoalId::new("water", "Diş fırçalarken musluğu kapatmak"));
        completed.insert(GoalId::new("electricity", "Enerji verimli LED ampuller kullanmak"));
        LocalSnapshot {
            completed_goals: completed,
            points: 15,
            last_updated: None,
        }
    }

    #[test]
    fn stash_moves_snapshot_and_raises_flag() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();

        assert!(engine.stash_anonymous_progress());

        // Primary keys are gone, stash holds the data, flag is up.
        assert_eq!(snapshot::read(local.as_ref()).unwrap(), None);
        let pending = engine.pending_merge().unwrap();
        assert_eq!(pending.completed_goals.len(), 2);
        assert_eq!(pending.points, 15);
    }

    #[test]
    fn empty_progress_raises_no_conflict() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &LocalSnapshot::default()).unwrap();

        assert!(!engine.stash_anonymous_progress());
        assert!(engine.pending_merge().is_none());
    }

    #[test]
    fn merge_returns_stashed_goals_and_drains() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        engine.stash_anonymous_progress();

        let absorbed = engine.resolve(MergeDecision::Merge);
        assert_eq!(absorbed.len(), 2);
        assert!(absorbed.contains(&GoalId::new("water", "Diş fırçalarken musluğu kapatmak")));

        assert!(engine.pending_merge().is_none());
        assert!(local.get(keys::MERGE_PENDING).unwrap().is_none());
        assert_eq!(
            snapshot::read_with_prefix(local.as_ref(), keys::TEMP_PREFIX).unwrap(),
            None
        );
    }

    #[test]
    fn discard_returns_nothing_and_drains() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        engine.stash_anonymous_progress();

        assert!(engine.resolve(MergeDecision::Discard).is_empty());
        assert!(engine.pending_merge().is_none());
        assert!(local.get(keys::MERGE_PENDING).unwrap().is_none());
    }

    #[test]
    fn resolve_without_pending_is_noop() {
        let (_, engine) = setup();
        assert!(engine.resolve(MergeDecision::Merge).is_empty());
    }

    #[test]
    fn flag_without_stash_is_cleaned_up() {
        let (local, engine) = setup();
        local.set(keys::MERGE_PENDING, "true").unwrap();

        assert!(engine.pending_merge().is_none());
        assert!(local.get(keys::MERGE_PENDING).unwrap().is_none());
    }

    #[test]
    fn sweep_clears_progress_behind_corrupt_marker() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        local.set(keys::USER_MARKER, "{not a session").unwrap();

        engine.sweep_stale_session();

        assert_eq!(snapshot::read(local.as_ref()).unwrap(), None);
        assert!(local.get(keys::USER_MARKER).unwrap().is_none());
    }

    #[test]
    fn sweep_leaves_valid_session_alone() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        write_session(
            local.as_ref(),
            &StoredSession {
                user_id: "u-1".into(),
                email: "eco@example.com".into(),
                access_token: "at".into(),
                refresh_token: "rt".into(),
            },
        );

        engine.sweep_stale_session();

        assert!(snapshot::read(local.as_ref()).unwrap().is_some());
        assert!(local.get(keys::USER_MARKER).unwrap().is_some());
    }

    #[test]
    fn logout_clears_primary_stash_and_completion_lists() {
        let (local, engine) = setup();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        engine.stash_anonymous_progress();
        snapshot::write(local.as_ref(), &anonymous_snapshot()).unwrap();
        local
            .set("ecoDailyCompleted-2026-08-30", r#"["task-2026-08-30-0"]"#)
            .unwrap();

        engine.clear_local_progress();

        assert_eq!(snapshot::read(local.as_ref()).unwrap(), None);
        assert!(engine.pending_merge().is_none());
        assert!(local.get("ecoDailyCompleted-2026-08-30").unwrap().is_none());
    }
}
