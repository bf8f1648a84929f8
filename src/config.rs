use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::rewards::{default_milestones, Milestone, MilestoneRule};
use crate::round::DEFAULT_ADVANCED_PROBABILITY;

pub const DEFAULT_INITIAL_TIME_SECS: f64 = 30.0;

/// Whether best combo and cleared levels start from the stored baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestsPolicy {
    #[default]
    CarryOver,
    PerSession,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub initial_time_secs: f64,
    pub base_score: u32,
    pub wrong_penalty_secs: f64,
    pub level_up_bonus_secs: f64,
    /// Chance of an Advanced round from level 2 on
    pub advanced_probability: f64,
    pub milestone_rule: MilestoneRule,
    pub combo_rewards: Vec<Milestone>,
    pub bests_policy: BestsPolicy,
    /// First level with covered options; `None` turns masking off
    pub mask_from_level: Option<u32>,
    pub mask_interval_ms: u64,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_time_secs: DEFAULT_INITIAL_TIME_SECS,
            base_score: 10,
            wrong_penalty_secs: 1.0,
            level_up_bonus_secs: 5.0,
            advanced_probability: DEFAULT_ADVANCED_PROBABILITY,
            milestone_rule: MilestoneRule::default(),
            combo_rewards: default_milestones(),
            bests_policy: BestsPolicy::default(),
            mask_from_level: Some(5),
            mask_interval_ms: 1000,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn without_rewards(mut self) -> Self {
        self.combo_rewards.clear();
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> GameConfig;
    fn save(&self, cfg: &GameConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("stroop_rush_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> GameConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<GameConfig>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        GameConfig::default()
    }

    fn save(&self, cfg: &GameConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
