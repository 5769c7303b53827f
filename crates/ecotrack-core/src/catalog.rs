//! Static goal catalog and daily-task templates.
//!
//! The catalog is read-only definition data: categories, the goals inside
//! them with their point values, and the template pool the daily task engine
//! draws from. Nothing in here is mutated at runtime; completion state lives
//! in [`crate::progress::ProgressStore`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One sustainability goal inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal text; unique within its category and part of the goal's key.
    pub text: String,
    /// Points awarded on completion. Always positive.
    pub points: u32,
}

/// A goal category (electricity, water, waste, energy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier, used as the first half of a [`GoalId`].
    /// Contains no `-` so the composite key stays parseable.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display icon.
    pub icon: String,
    pub goals: Vec<Goal>,
}

/// Template for a generated daily bonus task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub text: String,
    pub category: String,
    pub points: u32,
}

/// Composite key identifying a goal: `"{category}-{text}"`.
///
/// A `GoalId` may come from stale stored data and fail to resolve against
/// the catalog; resolution failures are dropped silently during point
/// recomputation, never surfaced as errors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoalId {
    pub category: String,
    pub text: String,
}

impl GoalId {
    pub fn new(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
        }
    }

    /// Parse the `"{category}-{text}"` composite form. Category ids never
    /// contain `-`, so the first hyphen is the separator.
    pub fn parse(s: &str) -> Option<Self> {
        let (category, text) = s.split_once('-')?;
        if category.is_empty() || text.is_empty() {
            return None;
        }
        Some(Self::new(category, text))
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.text)
    }
}

/// Static, read-only catalog of categories, goals and daily-task templates.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    templates: Vec<TaskTemplate>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, templates: Vec<TaskTemplate>) -> Self {
        Self {
            categories,
            templates,
        }
    }

    /// The built-in catalog shipped with the app.
    pub fn standard() -> Self {
        let categories = vec![
            category(
                "electricity",
                "Elektrik Tasarrufu",
                "⚡",
                &[
                    ("Kullanılmayan odaların ışıklarını kapatmak", 5),
                    ("Enerji verimli LED ampuller kullanmak", 10),
                    ("Elektronik cihazları bekleme modunda bırakmamak", 5),
                    ("Çamaşır makinesini tam doluyken çalıştırmak", 8),
                ],
            ),
            category(
                "water",
                "Su Tasarrufu",
                "💧",
                &[
                    ("Diş fırçalarken musluğu kapatmak", 5),
                    ("Duş süresini 5 dakika ile sınırlamak", 10),
                    ("Su sızıntılarını tamir etmek", 15),
                    ("Yağmur suyu biriktirmek", 20),
                ],
            ),
            category(
                "waste",
                "Atık Yönetimi",
                "♻️",
                &[
                    ("Çöpleri ayrıştırmak", 10),
                    ("Tek kullanımlık plastik kullanımını azaltmak", 15),
                    ("Kompost yapmak", 20),
                    ("Alışverişte bez torba kullanmak", 5),
                ],
            ),
            category(
                "energy",
                "Enerji Verimliliği",
                "🔋",
                &[
                    ("Doğal havalandırma kullanmak", 5),
                    ("Klimayı optimum sıcaklıkta kullanmak", 10),
                    ("Yalıtım önlemleri almak", 20),
                    ("Güneş enerjisi kullanmak", 25),
                ],
            ),
        ];

        let templates = vec![
            template("transport", "Toplu taşıma veya bisiklet kullanmak", 10),
            template("electricity", "Bir saat boyunca tüm ışıkları kapatmak", 5),
            template("waste", "Gün içinde hiç plastik poşet kullanmamak", 10),
            template("water", "Bulaşıkları makinede tam dolu yıkamak", 8),
            template("energy", "Termostatı bir derece düşürmek", 10),
            template("electricity", "Şarj cihazlarını prizden çekmek", 5),
            template("waste", "Bir atığı onarıp yeniden kullanmak", 15),
            template("water", "Gün boyu su tüketimini not etmek", 5),
        ];

        Self::new(categories, templates)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn templates(&self) -> &[TaskTemplate] {
        &self.templates
    }

    /// Resolve a goal id against the catalog. Returns `None` for stale or
    /// corrupt ids.
    pub fn resolve(&self, id: &GoalId) -> Option<&Goal> {
        self.categories
            .iter()
            .find(|c| c.id == id.category)?
            .goals
            .iter()
            .find(|g| g.text == id.text)
    }

    /// Sum of all catalog goal points. Daily-task points are intentionally
    /// excluded so goal progress stays bounded at 100%.
    pub fn max_points(&self) -> u32 {
        self.categories
            .iter()
            .flat_map(|c| &c.goals)
            .map(|g| g.points)
            .sum()
    }

    /// Goal count for one category, for per-category progress display.
    pub fn category_goal_count(&self, category_id: &str) -> usize {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.goals.len())
            .unwrap_or(0)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn category(id: &str, name: &str, icon: &str, goals: &[(&str, u32)]) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        goals: goals
            .iter()
            .map(|(text, points)| Goal {
                text: (*text).to_string(),
                points: *points,
            })
            .collect(),
    }
}

fn template(category: &str, text: &str, points: u32) -> TaskTemplate {
    TaskTemplate {
        text: text.to_string(),
        category: category.to_string(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_id_roundtrip() {
        let id = GoalId::new("water", "Diş fırçalarken musluğu kapatmak");
        let parsed = GoalId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn goal_id_parse_splits_on_first_hyphen() {
        // Goal text may itself contain hyphens
        let parsed = GoalId::parse("waste-Tek kullanımlık - plastik").unwrap();
        assert_eq!(parsed.category, "waste");
        assert_eq!(parsed.text, "Tek kullanımlık - plastik");
    }

    #[test]
    fn goal_id_parse_rejects_malformed() {
        assert!(GoalId::parse("no_separator").is_none());
        assert!(GoalId::parse("-leading").is_none());
        assert!(GoalId::parse("trailing-").is_none());
    }

    #[test]
    fn resolve_known_goal() {
        let catalog = Catalog::standard();
        let id = GoalId::new("water", "Diş fırçalarken musluğu kapatmak");
        let goal = catalog.resolve(&id).unwrap();
        assert_eq!(goal.points, 5);
    }

    #[test]
    fn resolve_unknown_goal_is_none() {
        let catalog = Catalog::standard();
        assert!(catalog.resolve(&GoalId::new("water", "Uydurma hedef")).is_none());
        assert!(catalog.resolve(&GoalId::new("nope", "Çöpleri ayrıştırmak")).is_none());
    }

    #[test]
    fn max_points_matches_catalog_sum() {
        let catalog = Catalog::standard();
        // 28 + 50 + 50 + 60 from the four categories
        assert_eq!(catalog.max_points(), 188);
    }

    #[test]
    fn category_ids_contain_no_hyphen() {
        for cat in Catalog::standard().categories() {
            assert!(!cat.id.contains('-'), "category id {} breaks GoalId parsing", cat.id);
        }
    }

    #[test]
    fn template_pool_is_non_empty() {
        assert!(!Catalog::standard().templates().is_empty());
    }
}
