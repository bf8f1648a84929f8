//! Combo milestones and the temporary effects they hand out.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::session::SessionState;

/// What a milestone pays out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardKind {
    /// Correct answers score twice for `duration_ms`. Stacks by extension.
    DoubleScore { duration_ms: u64 },
    /// Seconds added to the countdown, once.
    ExtraTime { seconds: f64 },
    /// Incorrect answers that cost nothing. Stacks by adding charges.
    Immunity { charges: u32 },
}

/// State of an effect right after it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RewardEffect {
    DoubleScore {
        #[serde(serialize_with = "as_secs")]
        expires_at: Duration,
    },
    ExtraTime {
        seconds: f64,
    },
    Immunity {
        charges_remaining: u32,
    },
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub combo: u32,
    pub reward: RewardKind,
}

impl Milestone {
    pub fn new(combo: u32, reward: RewardKind) -> Self {
        Self { combo, reward }
    }
}

/// When a milestone counts as reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneRule {
    /// Only when the combo equals the milestone value.
    Exact,
    /// Whenever the combo is a positive multiple of the milestone value.
    #[default]
    EveryMultiple,
}

impl MilestoneRule {
    pub fn fires(&self, milestone: u32, combo: u32) -> bool {
        if milestone == 0 || combo == 0 {
            return false;
        }
        match self {
            MilestoneRule::Exact => combo == milestone,
            MilestoneRule::EveryMultiple => combo % milestone == 0,
        }
    }
}

/// The shipped reward table.
pub fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone::new(3, RewardKind::DoubleScore { duration_ms: 5000 }),
        Milestone::new(6, RewardKind::Immunity { charges: 1 }),
        Milestone::new(10, RewardKind::ExtraTime { seconds: 5.0 }),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Activation {
    pub milestone: u32,
    pub reward: RewardKind,
    pub effect: RewardEffect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DoubleScore {
    expires_at: Duration,
    handle: TimerHandle,
}

/// Watches the combo and owns the live reward effects of one session.
#[derive(Debug, Clone)]
pub struct ComboRewardEngine {
    milestones: Vec<Milestone>,
    rule: MilestoneRule,
    last_combo: u32,
    double_score: Option<DoubleScore>,
}

impl ComboRewardEngine {
    pub fn new(mut milestones: Vec<Milestone>, rule: MilestoneRule) -> Self {
        milestones.sort_by_key(|m| m.combo);
        Self {
            milestones,
            rule,
            last_combo: 0,
            double_score: None,
        }
    }

    /// Look at the combo after an evaluation and fire whatever it crossed.
    ///
    /// Only upward movement fires. A reset to zero is noted but leaves every
    /// active effect alone.
    pub fn on_combo_changed(
        &mut self,
        state: &mut SessionState,
        now: Duration,
        scheduler: &mut Scheduler,
    ) -> Vec<Activation> {
        let previous = std::mem::replace(&mut self.last_combo, state.combo);
        if state.combo <= previous {
            return Vec::new();
        }

        let fired: Vec<Milestone> = self
            .milestones
            .iter()
            .filter(|m| self.rule.fires(m.combo, state.combo))
            .copied()
            .collect();

        fired
            .into_iter()
            .map(|m| {
                let effect = self.apply(m.reward, state, now, scheduler);
                tracing::info!(combo = state.combo, milestone = m.combo, reward = ?m.reward, "reward activated");
                Activation {
                    milestone: m.combo,
                    reward: m.reward,
                    effect,
                }
            })
            .collect()
    }

    fn apply(
        &mut self,
        reward: RewardKind,
        state: &mut SessionState,
        now: Duration,
        scheduler: &mut Scheduler,
    ) -> RewardEffect {
        match reward {
            RewardKind::DoubleScore { duration_ms } => {
                let duration = Duration::from_millis(duration_ms);
                let expires_at = match self.double_score.take() {
                    Some(active) => {
                        scheduler.cancel(active.handle);
                        active.expires_at + duration
                    }
                    None => now + duration,
                };
                let handle = scheduler.schedule_once(expires_at, TimerKind::DoubleScoreExpiry);
                self.double_score = Some(DoubleScore { expires_at, handle });
                state.double_score_active = true;
                RewardEffect::DoubleScore { expires_at }
            }
            RewardKind::ExtraTime { seconds } => {
                state.remaining_time += seconds;
                RewardEffect::ExtraTime { seconds }
            }
            RewardKind::Immunity { charges } => {
                state.immunity_count = state.immunity_count.saturating_add(charges);
                RewardEffect::Immunity {
                    charges_remaining: state.immunity_count,
                }
            }
        }
    }

    /// Handle a fired timer. Returns true if it belonged to this engine.
    pub fn on_timer(&mut self, handle: TimerHandle, state: &mut SessionState) -> bool {
        match self.double_score {
            Some(active) if active.handle == handle => {
                self.double_score = None;
                state.double_score_active = false;
                tracing::debug!("double score expired");
                true
            }
            _ => false,
        }
    }

    pub fn double_score_expires_at(&self) -> Option<Duration> {
        self.double_score.map(|d| d.expires_at)
    }

    pub fn double_score_remaining(&self, now: Duration) -> Option<Duration> {
        self.double_score_expires_at()
            .map(|expires_at| expires_at.saturating_sub(now))
    }

    /// Drop live effects. Their timers go with the scheduler on teardown.
    pub fn clear(&mut self, state: &mut SessionState) {
        self.double_score = None;
        state.double_score_active = false;
    }
}

impl Default for ComboRewardEngine {
    fn default() -> Self {
        Self::new(default_milestones(), MilestoneRule::default())
    }
}
