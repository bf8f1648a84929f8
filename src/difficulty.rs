use std::collections::HashSet;

use serde::Serialize;

use crate::error::{GameError, GameResult};
use crate::palette::{canonical_color_of, ColorId, WordId};
use crate::session::SessionState;

/// What a single level looks like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultySettings {
    pub color_set: Vec<ColorId>,
    pub word_set: Vec<WordId>,
    pub option_count: usize,
    /// Score at which the player leaves this level.
    pub score_threshold: u32,
}

impl DifficultySettings {
    /// Build a tier, rejecting sets that would leave round generation without
    /// a valid target or a valid mismatch pair.
    pub fn new(
        color_set: Vec<ColorId>,
        word_set: Vec<WordId>,
        option_count: usize,
        score_threshold: u32,
    ) -> GameResult<Self> {
        let settings = Self {
            color_set,
            word_set,
            option_count,
            score_threshold,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants round generation relies on. Tiers built as struct
    /// literals go through this when they enter a [`DifficultyTable`].
    pub fn validate(&self) -> GameResult<()> {
        if self.color_set.len() < 2 {
            return Err(GameError::InvalidDifficulty(
                "at least two colors are required".into(),
            ));
        }
        let meanings: HashSet<ColorId> = self
            .word_set
            .iter()
            .map(|w| canonical_color_of(*w))
            .collect();
        if meanings.len() < 2 {
            return Err(GameError::InvalidDifficulty(
                "at least two words with different meanings are required".into(),
            ));
        }
        if let Some(word) = self
            .word_set
            .iter()
            .find(|w| !self.color_set.contains(&canonical_color_of(**w)))
        {
            return Err(GameError::InvalidDifficulty(format!(
                "word {word} names a color outside the color set"
            )));
        }
        if self.option_count < 2 {
            return Err(GameError::InvalidDifficulty(
                "a round needs at least two options".into(),
            ));
        }
        Ok(())
    }
}

/// Level -> settings lookup. Levels past the last explicit tier reuse it and
/// raise the threshold by `threshold_increment` per level.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyTable {
    tiers: Vec<DifficultySettings>,
    threshold_increment: u32,
}

pub const DEFAULT_THRESHOLD_INCREMENT: u32 = 100;

impl DifficultyTable {
    pub fn new(tiers: Vec<DifficultySettings>, threshold_increment: u32) -> GameResult<Self> {
        if tiers.is_empty() {
            return Err(GameError::InvalidDifficulty(
                "difficulty table has no tiers".into(),
            ));
        }
        for (idx, tier) in tiers.iter().enumerate() {
            tier.validate().map_err(|err| match err {
                GameError::InvalidDifficulty(reason) => {
                    GameError::InvalidDifficulty(format!("tier {}: {reason}", idx + 1))
                }
                other => other,
            })?;
        }
        Ok(Self {
            tiers,
            threshold_increment,
        })
    }

    /// The tuning the game ships with.
    pub fn standard() -> Self {
        use ColorId as C;
        use WordId as W;

        let tiers = vec![
            DifficultySettings {
                color_set: vec![C::Red, C::Yellow, C::Blue],
                word_set: vec![W::Red, W::Yellow, W::Blue],
                option_count: 4,
                score_threshold: 70,
            },
            DifficultySettings {
                color_set: vec![C::Red, C::Yellow, C::Blue, C::Green],
                word_set: vec![W::Red, W::Yellow, W::Blue, W::Green],
                option_count: 6,
                score_threshold: 150,
            },
            DifficultySettings {
                color_set: ColorId::ALL.to_vec(),
                word_set: WordId::ALL.to_vec(),
                option_count: 9,
                score_threshold: 240,
            },
        ];

        Self {
            tiers,
            threshold_increment: DEFAULT_THRESHOLD_INCREMENT,
        }
    }

    /// Settings for `level` (1-based). Level 0 is treated as level 1.
    pub fn settings_for(&self, level: u32) -> DifficultySettings {
        let idx = level.max(1) as usize - 1;
        match self.tiers.get(idx) {
            Some(tier) => tier.clone(),
            None => {
                let last_idx = self.tiers.len() - 1;
                let mut tier = self.tiers[last_idx].clone();
                let extra_levels = (idx - last_idx) as u32;
                tier.score_threshold += self.threshold_increment * extra_levels;
                tier
            }
        }
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Promote the player if the score has reached the current level's threshold.
///
/// Advances at most one level per call. Returns the new settings on a level-up.
pub fn check_level_up(
    state: &mut SessionState,
    table: &DifficultyTable,
    time_bonus_secs: f64,
) -> Option<DifficultySettings> {
    let current = table.settings_for(state.level);
    if state.score < current.score_threshold {
        return None;
    }

    state.level += 1;
    state.cleared_levels += 1;
    state.remaining_time += time_bonus_secs;

    tracing::info!(
        level = state.level,
        score = state.score,
        bonus = time_bonus_secs,
        "level up"
    );

    Some(table.settings_for(state.level))
}
