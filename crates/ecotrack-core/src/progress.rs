//! Session-scoped progress state and point recomputation.
//!
//! `ProgressStore` owns the completed-goal set and the derived point total
//! for one page/app session. The cached total is never an input to any
//! computation: every save path goes through [`ProgressStore::recompute_points`],
//! which rebuilds the total from the completed set and the catalog. Stored
//! ids that no longer resolve in the catalog are dropped silently.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, GoalId};

/// In-memory completion state and derived points for the current session.
///
/// There is exactly one instance per session, owned by the caller and
/// passed explicitly; no module-level state.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    completed: BTreeSet<GoalId>,
    /// Points from completed daily bonus tasks, fed in by the daily task
    /// engine. Included in the recomputed total, excluded from max.
    daily_bonus: u32,
    /// Cached output of the last recomputation. Output only.
    points: u32,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the store from a loaded snapshot. The snapshot's point total
    /// is kept only until the next recompute.
    pub fn from_loaded(completed: BTreeSet<GoalId>, points: u32) -> Self {
        Self {
            completed,
            daily_bonus: 0,
            points,
        }
    }

    /// Flip membership of `id` in the completed set.
    ///
    /// Returns `Some(now_completed)` on success. An id that does not
    /// resolve in the catalog is a silent no-op returning `None`; stale UI
    /// or corrupt data must never crash the app. The caller is responsible
    /// for the recompute-then-persist cycle afterwards.
    pub fn toggle(&mut self, catalog: &Catalog, id: &GoalId) -> Option<bool> {
        catalog.resolve(id)?;
        let now_completed = if self.completed.contains(id) {
            self.completed.remove(id);
            false
        } else {
            self.completed.insert(id.clone());
            true
        };
        Some(now_completed)
    }

    /// Recompute the point total from scratch: catalog-resolvable completed
    /// goals plus the daily bonus. Overwrites the cached total and returns
    /// it. Idempotent and order-independent.
    pub fn recompute_points(&mut self, catalog: &Catalog) -> u32 {
        let goal_points: u32 = self
            .completed
            .iter()
            .filter_map(|id| catalog.resolve(id))
            .map(|g| g.points)
            .sum();
        self.points = goal_points + self.daily_bonus;
        self.points
    }

    /// Clear all completed goals and recompute (used on logout).
    pub fn reset(&mut self, catalog: &Catalog) {
        self.completed.clear();
        self.daily_bonus = 0;
        self.recompute_points(catalog);
    }

    /// Replace the daily bonus contribution. Callers recompute afterwards.
    pub fn set_daily_bonus(&mut self, points: u32) {
        self.daily_bonus = points;
    }

    pub fn daily_bonus(&self) -> u32 {
        self.daily_bonus
    }

    /// Union additional goal ids into the completed set (merge flow).
    pub fn absorb<I: IntoIterator<Item = GoalId>>(&mut self, ids: I) {
        self.completed.extend(ids);
    }

    /// Cached total from the last recompute.
    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn completed(&self) -> &BTreeSet<GoalId> {
        &self.completed
    }

    pub fn is_completed(&self, id: &GoalId) -> bool {
        self.completed.contains(id)
    }

    /// Completed goals in one category that still resolve in the catalog.
    pub fn completed_in_category(&self, catalog: &Catalog, category_id: &str) -> usize {
        self.completed
            .iter()
            .filter(|id| id.category == category_id)
            .filter(|id| catalog.resolve(id).is_some())
            .count()
    }

    /// Goal progress in percent, from catalog goals only. Bounded at 100
    /// because daily bonus points are excluded from both sides.
    pub fn progress_percent(&self, catalog: &Catalog) -> u8 {
        let max = catalog.max_points();
        if max == 0 {
            return 0;
        }
        let goal_points: u32 = self
            .completed
            .iter()
            .filter_map(|id| catalog.resolve(id))
            .map(|g| g.points)
            .sum();
        ((goal_points * 100) / max).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::standard()
    }

    fn water_goal() -> GoalId {
        GoalId::new("water", "Diş fırçalarken musluğu kapatmak")
    }

    #[test]
    fn toggle_then_recompute_awards_points() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        assert_eq!(store.toggle(&catalog, &water_goal()), Some(true));
        assert_eq!(store.recompute_points(&catalog), 5);
    }

    #[test]
    fn toggle_twice_is_involution() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        store.toggle(&catalog, &water_goal());
        store.toggle(&catalog, &water_goal());
        assert!(store.completed().is_empty());
        assert_eq!(store.recompute_points(&catalog), 0);
    }

    #[test]
    fn toggle_unknown_goal_is_silent_noop() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        assert_eq!(store.toggle(&catalog, &GoalId::new("water", "Yok böyle bir hedef")), None);
        assert!(store.completed().is_empty());
    }

    #[test]
    fn unresolvable_stored_id_excluded_from_points() {
        let catalog = catalog();
        let mut completed = BTreeSet::new();
        completed.insert(water_goal());
        completed.insert(GoalId::new("ghost", "Silinmiş hedef"));
        // Stale cached total from a tampered snapshot
        let mut store = ProgressStore::from_loaded(completed, 9999);
        assert_eq!(store.recompute_points(&catalog), 5);
    }

    #[test]
    fn recompute_is_idempotent() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        store.toggle(&catalog, &water_goal());
        store.set_daily_bonus(10);
        let first = store.recompute_points(&catalog);
        let second = store.recompute_points(&catalog);
        assert_eq!(first, second);
        assert_eq!(first, 15);
    }

    #[test]
    fn reset_clears_everything() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        store.toggle(&catalog, &water_goal());
        store.set_daily_bonus(10);
        store.recompute_points(&catalog);
        store.reset(&catalog);
        assert!(store.completed().is_empty());
        assert_eq!(store.points(), 0);
    }

    #[test]
    fn daily_bonus_does_not_inflate_percent() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        store.set_daily_bonus(10_000);
        store.recompute_points(&catalog);
        assert_eq!(store.progress_percent(&catalog), 0);
    }

    #[test]
    fn completed_in_category_ignores_stale_ids() {
        let catalog = catalog();
        let mut store = ProgressStore::new();
        store.toggle(&catalog, &water_goal());
        store.absorb([GoalId::new("water", "Eski sürümden kalan hedef")]);
        assert_eq!(store.completed_in_category(&catalog, "water"), 1);
    }

    /// Every (category, goal) pair in the standard catalog.
    fn all_goal_ids() -> Vec<GoalId> {
        Catalog::standard()
            .categories()
            .iter()
            .flat_map(|c| {
                c.goals
                    .iter()
                    .map(|g| GoalId::new(c.id.clone(), g.text.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    proptest! {
        /// Property: the recomputed total only depends on the final set
        /// membership, not on the order or number of toggles.
        #[test]
        fn recompute_is_order_independent(
            indices in proptest::collection::vec(0usize..16, 0..40),
        ) {
            let catalog = Catalog::standard();
            let ids = all_goal_ids();

            let mut store = ProgressStore::new();
            for i in &indices {
                store.toggle(&catalog, &ids[*i]);
            }
            let forward = store.recompute_points(&catalog);

            let mut reversed = ProgressStore::new();
            for i in indices.iter().rev() {
                reversed.toggle(&catalog, &ids[*i]);
            }
            let backward = reversed.recompute_points(&catalog);

            prop_assert_eq!(forward, backward);
            prop_assert_eq!(store.completed(), reversed.completed());

            // And the total always equals the sum over the final set.
            let expected: u32 = store
                .completed()
                .iter()
                .filter_map(|id| catalog.resolve(id))
                .map(|g| g.points)
                .sum();
            prop_assert_eq!(forward, expected);
        }

        /// Property: toggling any goal twice restores membership and points.
        #[test]
        fn double_toggle_restores_state(index in 0usize..16) {
            let catalog = Catalog::standard();
            let ids = all_goal_ids();
            let mut store = ProgressStore::new();
            store.toggle(&catalog, &ids[0]);
            let before = store.recompute_points(&catalog);
            let snapshot = store.completed().clone();

            store.toggle(&catalog, &ids[index]);
            store.toggle(&catalog, &ids[index]);

            prop_assert_eq!(store.recompute_points(&catalog), before);
            prop_assert_eq!(store.completed(), &snapshot);
        }
    }
}
