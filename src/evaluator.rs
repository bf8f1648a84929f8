use serde::Serialize;

use crate::round::{OptionCard, RoundSpec};
use crate::session::SessionState;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Inputs to an evaluation that do not live in the session state.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct EvalContext {
    /// Clock reading in seconds, same base as `SessionState::last_prompt_at`
    pub now_secs: f64,
    pub base_score: u32,
    pub wrong_penalty_secs: f64,
    /// Every answer counts as correct while set.
    pub debug_override: bool,
}

/// Judge `selected` against the round and apply the scoring side effects.
///
/// Never advances to the next round; the caller does that after reading the outcome.
pub fn evaluate(
    round: &RoundSpec,
    selected: &OptionCard,
    state: &mut SessionState,
    ctx: &EvalContext,
) -> Outcome {
    let outcome = if ctx.debug_override || round.is_correct(selected) {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    match outcome {
        Outcome::Correct => apply_correct(state, ctx),
        Outcome::Incorrect => apply_incorrect(state, ctx),
    }

    outcome
}

fn apply_correct(state: &mut SessionState, ctx: &EvalContext) {
    state.total_clicks += 1;
    state.correct_clicks += 1;
    state
        .reaction_times
        .push((ctx.now_secs - state.last_prompt_at).max(0.0));

    let multiplier = if state.double_score_active { 2 } else { 1 };
    state.score += ctx.base_score * multiplier;

    state.combo += 1;
    state.max_combo = state.max_combo.max(state.combo);
    state.consecutive_errors = 0;
}

fn apply_incorrect(state: &mut SessionState, ctx: &EvalContext) {
    state.total_clicks += 1;

    if state.immunity_count > 0 {
        state.immunity_count -= 1;
        tracing::debug!(remaining = state.immunity_count, "immunity absorbed a miss");
        return;
    }

    state.combo = 0;
    state.consecutive_errors += 1;
    state.remaining_time = (state.remaining_time - ctx.wrong_penalty_secs).max(0.0);
}
