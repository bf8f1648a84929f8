use serde::Serialize;

/// Figures the achievement predicates look at when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AchievementStats {
    pub max_combo: u32,
    pub cleared_levels: u32,
    pub total_time: f64,
    pub consecutive_errors: u32,
}

/// Decides which achievements a finished session unlocks.
pub trait AchievementEvaluator {
    /// Ids unlocked by `stats` that are not in `already_unlocked`.
    fn newly_unlocked(&self, stats: &AchievementStats, already_unlocked: &[String]) -> Vec<String>;

    /// Display metadata, for evaluators that have any.
    fn catalog(&self) -> Option<&AchievementCatalog> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: fn(&AchievementStats) -> bool,
}

#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    pub fn new(achievements: Vec<Achievement>) -> Self {
        Self { achievements }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Achievement {
                id: "combo-master",
                name: "Combo Master",
                description: "Reach a 15 answer combo",
                condition: |s| s.max_combo >= 15,
            },
            Achievement {
                id: "speed-runner",
                name: "Speed Runner",
                description: "Clear 3 levels within 60 seconds",
                condition: |s| s.cleared_levels >= 3 && s.total_time <= 60.0,
            },
            Achievement {
                id: "persistent",
                name: "Persistent",
                description: "Clear a level after 5 misses in a row",
                condition: |s| s.consecutive_errors >= 5 && s.cleared_levels > 0,
            },
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    /// Display name for `id`, or the id itself when it is not in the catalog.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |a| a.name)
    }

    /// Every achievement paired with whether `unlocked` contains it.
    pub fn progress<'a>(
        &'a self,
        unlocked: &'a [String],
    ) -> impl Iterator<Item = (&'a Achievement, bool)> + 'a {
        self.iter()
            .map(move |a| (a, unlocked.iter().any(|id| id == a.id)))
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl AchievementEvaluator for AchievementCatalog {
    fn newly_unlocked(&self, stats: &AchievementStats, already_unlocked: &[String]) -> Vec<String> {
        self.achievements
            .iter()
            .filter(|a| !already_unlocked.iter().any(|id| id == a.id))
            .filter(|a| (a.condition)(stats))
            .map(|a| a.id.to_string())
            .collect()
    }

    fn catalog(&self) -> Option<&AchievementCatalog> {
        Some(self)
    }
}
