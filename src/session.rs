use chrono::{DateTime, Local};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::round::{Mode, OptionCard, RoundSpec, Target};
use crate::util::mean;

/// Mutable record of one play-through. Owned by the engine; everything else
/// sees it through a [`SessionSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    /// Seconds left. May dip below zero until the next clock tick ends the session.
    pub remaining_time: f64,
    pub total_time: f64,
    pub level: u32,
    pub cleared_levels: u32,
    pub consecutive_errors: u32,
    pub double_score_active: bool,
    pub immunity_count: u32,
    pub total_clicks: u32,
    pub correct_clicks: u32,
    /// Seconds from prompt to click, one per correct answer
    pub reaction_times: Vec<f64>,
    /// Clock reading (seconds) when the current round was shown
    pub last_prompt_at: f64,
}

impl SessionState {
    pub fn new(initial_time_secs: f64) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            remaining_time: initial_time_secs,
            total_time: 0.0,
            level: 1,
            cleared_levels: 0,
            consecutive_errors: 0,
            double_score_active: false,
            immunity_count: 0,
            total_clicks: 0,
            correct_clicks: 0,
            reaction_times: Vec::new(),
            last_prompt_at: 0.0,
        }
    }

    /// Remaining time as shown to the player: never negative, truncated to tenths.
    pub fn display_time(&self) -> f64 {
        (self.remaining_time.max(0.0) * 10.0).floor() / 10.0
    }

    /// Percentage of clicks that were correct, rounded; 0 with no clicks.
    pub fn accuracy(&self) -> f64 {
        if self.total_clicks == 0 {
            return 0.0;
        }
        ((self.correct_clicks as f64 / self.total_clicks as f64) * 100.0).round()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_INITIAL_TIME_SECS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Running,
    Finished,
}

/// What a client needs to draw the current round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundView {
    pub mode: Mode,
    pub prompt: String,
    pub options: Vec<OptionCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// Indices currently hidden by the masking effect
    pub covered: Vec<usize>,
}

impl RoundView {
    pub fn new(round: &RoundSpec, covered: &[usize]) -> Self {
        Self {
            mode: round.mode(),
            prompt: round.prompt(),
            options: round.options().to_vec(),
            target: round.target(),
            covered: covered.to_vec(),
        }
    }
}

/// Read-only projection of the session for presentation and automation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: u64,
    pub phase: SessionPhase,
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub remaining_time: f64,
    pub total_time: f64,
    pub level: u32,
    pub cleared_levels: u32,
    pub consecutive_errors: u32,
    pub double_score_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_score_remaining: Option<f64>,
    pub immunity_count: u32,
    pub total_clicks: u32,
    pub correct_clicks: u32,
    pub debug: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        let state = SessionState::new(0.0);
        Self {
            session_id: 0,
            phase: SessionPhase::Idle,
            score: state.score,
            combo: state.combo,
            max_combo: state.max_combo,
            remaining_time: 0.0,
            total_time: 0.0,
            level: state.level,
            cleared_levels: 0,
            consecutive_errors: 0,
            double_score_active: false,
            double_score_remaining: None,
            immunity_count: 0,
            total_clicks: 0,
            correct_clicks: 0,
            debug: false,
            round: None,
        }
    }
}

/// Summary handed out once a session ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalResult {
    pub score: u32,
    pub max_combo: u32,
    pub cleared_levels: u32,
    /// Percentage in [0, 100]
    pub accuracy: f64,
    /// Seconds; 0.0 when nothing was answered correctly
    pub fastest_reaction: f64,
    pub average_reaction: f64,
    pub total_time: f64,
    pub unlocked_achievements: Vec<String>,
    pub finished_at: DateTime<Local>,
}

impl FinalResult {
    pub fn from_state(state: &SessionState, unlocked_achievements: Vec<String>) -> Self {
        let fastest_reaction = match state
            .reaction_times
            .iter()
            .copied()
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => 0.0,
            MinMaxResult::OneElement(t) => t,
            MinMaxResult::MinMax(min, _) => min,
        };

        Self {
            score: state.score,
            max_combo: state.max_combo,
            cleared_levels: state.cleared_levels,
            accuracy: state.accuracy(),
            fastest_reaction,
            average_reaction: mean(&state.reaction_times).unwrap_or(0.0),
            total_time: state.total_time,
            unlocked_achievements,
            finished_at: Local::now(),
        }
    }

    pub fn share_text(&self) -> String {
        format!(
            "I scored {} in Stroop Rush with a best combo of {} and {} levels cleared! {}% accuracy, {:.2}s average reaction. Can you beat it?",
            self.score, self.max_combo, self.cleared_levels, self.accuracy, self.average_reaction
        )
    }
}
