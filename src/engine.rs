//! The session engine: one owner for the state, the current round and every
//! timer of a play-through.
//!
//! Everything is driven from outside. The front-end calls [`Engine::pump`]
//! on its own tick to let due timers fire, and the player's clicks come in
//! through [`Engine::submit_answer`], which pumps first. Both paths run on
//! the caller's thread, so a timer firing and a click never interleave.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::achievements::{AchievementCatalog, AchievementEvaluator, AchievementStats};
use crate::clock::{Clock, ClockSignal, SessionClock, SystemClock, TICK};
use crate::config::{BestsPolicy, GameConfig};
use crate::difficulty::{check_level_up, DifficultySettings, DifficultyTable};
use crate::error::{GameError, GameResult};
use crate::evaluator::{evaluate, EvalContext, Outcome};
use crate::persistence::{Baseline, BaselineStore, FileBaselineStore};
use crate::rewards::{ComboRewardEngine, RewardKind};
use crate::round::{RoundGenerator, RoundSpec};
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::session::{FinalResult, RoundView, SessionPhase, SessionSnapshot, SessionState};

use std::time::Duration;

/// Upper bound on simultaneously covered options
const MAX_COVERED: usize = 8;

/// What happened on one click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerReport {
    pub outcome: Outcome,
    pub snapshot: SessionSnapshot,
    pub rewards_fired: Vec<RewardKind>,
    pub immunity_consumed: bool,
    pub leveled_up: bool,
    /// Seconds from prompt to click, for correct answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_time: Option<f64>,
}

/// Everything scoped to a single play-through. Dropping it drops its timers.
#[derive(Debug)]
struct ActiveSession {
    id: u64,
    phase: SessionPhase,
    state: SessionState,
    settings: DifficultySettings,
    round: Option<RoundSpec>,
    clock: SessionClock,
    rewards: ComboRewardEngine,
    scheduler: Scheduler,
    tick: Option<TimerHandle>,
    mask: Option<TimerHandle>,
    covered: Vec<usize>,
    result: Option<FinalResult>,
}

impl ActiveSession {
    fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    fn teardown(&mut self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        self.tick = None;
        self.mask = None;
        self.covered.clear();
        self.clock.stop();
        self.rewards.clear(&mut self.state);
        cancelled
    }
}

pub struct Engine<C: Clock = SystemClock> {
    config: GameConfig,
    table: DifficultyTable,
    generator: RoundGenerator,
    clock: C,
    rng: StdRng,
    achievements: Box<dyn AchievementEvaluator>,
    store: Box<dyn BaselineStore>,
    baseline: Baseline,
    debug: bool,
    session: Option<ActiveSession>,
    sessions_started: u64,
}

impl Engine<SystemClock> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(config: GameConfig, clock: C) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = FileBaselineStore::new();
        let baseline = store.load();
        Self {
            generator: RoundGenerator::new(config.advanced_probability),
            table: DifficultyTable::standard(),
            clock,
            rng,
            achievements: Box::new(AchievementCatalog::standard()),
            store: Box::new(store),
            baseline,
            debug: false,
            session: None,
            sessions_started: 0,
            config,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Swap the baseline store and read the bests it holds right away, so a
    /// menu can show them before the first session.
    pub fn with_store(mut self, store: impl BaselineStore + 'static) -> Self {
        self.baseline = store.load();
        self.store = Box::new(store);
        self
    }

    pub fn with_achievements(mut self, evaluator: impl AchievementEvaluator + 'static) -> Self {
        self.achievements = Box::new(evaluator);
        self
    }

    pub fn with_table(mut self, table: DifficultyTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Baseline as of construction or the last session start or end.
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Idle, |s| s.phase)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Every answer is judged correct while set.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
        tracing::info!(enabled, "debug override");
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.set_debug(!self.debug);
        self.debug
    }

    /// Timers owned by the current session, zero when idle.
    pub fn live_timers(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.scheduler.live_count())
    }

    /// Display metadata for achievements, when the evaluator has any.
    pub fn achievement_catalog(&self) -> Option<&AchievementCatalog> {
        self.achievements.catalog()
    }

    pub fn last_result(&self) -> Option<&FinalResult> {
        self.session.as_ref().and_then(|s| s.result.as_ref())
    }

    /// Reset to level 1 and show the first round. A session still in
    /// progress is torn down first without being persisted.
    pub fn start_session(&mut self) -> SessionSnapshot {
        self.abandon_session();

        self.sessions_started += 1;
        self.baseline = self.store.load();

        let mut state = SessionState::new(self.config.initial_time_secs);
        if self.config.bests_policy == BestsPolicy::CarryOver {
            state.max_combo = self.baseline.max_combo;
            state.cleared_levels = self.baseline.cleared_levels;
        }

        let mut clock = SessionClock::new();
        clock.start();

        self.session = Some(ActiveSession {
            id: self.sessions_started,
            phase: SessionPhase::Running,
            settings: self.table.settings_for(state.level),
            state,
            round: None,
            clock,
            rewards: ComboRewardEngine::new(
                self.config.combo_rewards.clone(),
                self.config.milestone_rule,
            ),
            scheduler: Scheduler::new(),
            tick: None,
            mask: None,
            covered: Vec::new(),
            result: None,
        });
        tracing::info!(session = self.sessions_started, "session started");

        self.begin_round();
        self.get_snapshot()
    }

    /// Generate the next round and re-arm the per-round timers.
    fn begin_round(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let round = self
            .generator
            .generate(&session.settings, session.state.level, &mut self.rng);
        session.state.last_prompt_at = now.as_secs_f64();

        // the countdown restarts with every round
        if let Some(tick) = session.tick.take() {
            session.scheduler.cancel(tick);
        }
        session.tick = Some(
            session
                .scheduler
                .schedule_repeating(now + TICK, TICK, TimerKind::SessionTick),
        );
        session.clock.restart();

        if let Some(mask) = session.mask.take() {
            session.scheduler.cancel(mask);
        }
        session.covered.clear();
        if self
            .config
            .mask_from_level
            .is_some_and(|from| session.state.level >= from)
        {
            let interval = Duration::from_millis(self.config.mask_interval_ms);
            session.mask = Some(session.scheduler.schedule_repeating(
                now + interval,
                interval,
                TimerKind::MaskRotate,
            ));
        }

        tracing::debug!(
            level = session.state.level,
            mode = %round.mode(),
            options = round.len(),
            "new round"
        );
        session.round = Some(round);
    }

    /// Fire every timer that is due. Returns the phase afterwards.
    pub fn pump(&mut self) -> SessionPhase {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return SessionPhase::Idle;
        };
        if !session.is_running() {
            return session.phase;
        }

        let mut expired = false;
        while let Some((handle, kind)) = session.scheduler.pop_due(now) {
            match kind {
                TimerKind::SessionTick => {
                    if session.clock.tick(&mut session.state) == ClockSignal::Expired {
                        expired = true;
                        break;
                    }
                }
                TimerKind::DoubleScoreExpiry => {
                    session.rewards.on_timer(handle, &mut session.state);
                }
                TimerKind::MaskRotate => {
                    let option_count = session.round.as_ref().map_or(0, |r| r.len());
                    session.covered =
                        roll_covered(session.state.level, option_count, &mut self.rng);
                }
            }
        }

        if expired {
            tracing::info!("time is up");
            self.finalize();
        }
        self.phase()
    }

    pub fn submit_answer(&mut self, index: usize) -> GameResult<AnswerReport> {
        self.pump();
        let now = self.clock.now();

        let session = self
            .session
            .as_mut()
            .filter(|s| s.is_running())
            .ok_or(GameError::NoActiveRound)?;
        let round = session.round.as_ref().ok_or(GameError::NoActiveRound)?;
        let selected = *round.option(index).ok_or(GameError::InvalidOption {
            index,
            len: round.len(),
        })?;

        if let Some(mask) = session.mask.take() {
            session.scheduler.cancel(mask);
        }
        session.covered.clear();

        let ctx = EvalContext {
            now_secs: now.as_secs_f64(),
            base_score: self.config.base_score,
            wrong_penalty_secs: self.config.wrong_penalty_secs,
            debug_override: self.debug,
        };
        let immunity_before = session.state.immunity_count;
        let outcome = evaluate(round, &selected, &mut session.state, &ctx);

        let activations =
            session
                .rewards
                .on_combo_changed(&mut session.state, now, &mut session.scheduler);

        let mut leveled_up = false;
        let mut reaction_time = None;
        if outcome == Outcome::Correct {
            reaction_time = session.state.reaction_times.last().copied();
            if let Some(settings) =
                check_level_up(&mut session.state, &self.table, self.config.level_up_bonus_secs)
            {
                session.settings = settings;
                leveled_up = true;
            }
        }
        let immunity_consumed = session.state.immunity_count < immunity_before;

        tracing::debug!(
            session = session.id,
            %outcome,
            score = session.state.score,
            combo = session.state.combo,
            "answer"
        );

        self.begin_round();

        Ok(AnswerReport {
            outcome,
            snapshot: self.get_snapshot(),
            rewards_fired: activations.iter().map(|a| a.reward).collect(),
            immunity_consumed,
            leveled_up,
            reaction_time,
        })
    }

    pub fn get_snapshot(&self) -> SessionSnapshot {
        let Some(session) = self.session.as_ref() else {
            let mut idle = SessionSnapshot::idle();
            idle.debug = self.debug;
            return idle;
        };
        let state = &session.state;
        let now = self.clock.now();

        SessionSnapshot {
            session_id: session.id,
            phase: session.phase,
            score: state.score,
            combo: state.combo,
            max_combo: state.max_combo,
            remaining_time: state.display_time(),
            total_time: state.total_time,
            level: state.level,
            cleared_levels: state.cleared_levels,
            consecutive_errors: state.consecutive_errors,
            double_score_active: state.double_score_active,
            double_score_remaining: session
                .rewards
                .double_score_remaining(now)
                .map(|d| d.as_secs_f64()),
            immunity_count: state.immunity_count,
            total_clicks: state.total_clicks,
            correct_clicks: state.correct_clicks,
            debug: self.debug,
            round: session
                .round
                .as_ref()
                .filter(|_| session.is_running())
                .map(|r| RoundView::new(r, &session.covered)),
        }
    }

    /// Finish now. A session that already ended returns its stored result.
    pub fn end_session(&mut self) -> GameResult<FinalResult> {
        self.pump();
        self.finalize().ok_or(GameError::NoActiveRound)
    }

    /// Drop the session without recording anything, e.g. back to the menu.
    pub fn abandon_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let cancelled = session.teardown();
            tracing::debug!(session = session.id, cancelled, "session torn down");
        }
    }

    /// End the running session exactly once; later calls return the cache.
    fn finalize(&mut self) -> Option<FinalResult> {
        let session = self.session.as_mut()?;
        if !session.is_running() {
            return session.result.clone();
        }

        let cancelled = session.teardown();
        session.phase = SessionPhase::Finished;

        let state = &session.state;
        let stats = AchievementStats {
            max_combo: state.max_combo,
            cleared_levels: state.cleared_levels,
            total_time: state.total_time,
            consecutive_errors: state.consecutive_errors,
        };
        let unlocked = self
            .achievements
            .newly_unlocked(&stats, &self.baseline.unlocked_achievements);

        let next = self
            .baseline
            .merged(state.max_combo, state.cleared_levels, &unlocked);
        if let Err(err) = self.store.save(&next) {
            tracing::warn!(error = %err, "could not persist baseline");
        }
        self.baseline = next;

        let result = FinalResult::from_state(state, unlocked);
        tracing::info!(
            session = session.id,
            score = result.score,
            max_combo = result.max_combo,
            cleared_levels = result.cleared_levels,
            cancelled,
            "session finished"
        );
        session.result = Some(result.clone());
        Some(result)
    }
}

/// Distinct option indices to hide at `level`, sorted.
fn roll_covered(level: u32, option_count: usize, rng: &mut StdRng) -> Vec<usize> {
    let wanted = (level.saturating_sub(5) / 5 + 1) as usize;
    let count = wanted.min(MAX_COVERED).min(option_count);
    let mut covered = rand::seq::index::sample(rng, option_count, count).into_vec();
    covered.sort_unstable();
    covered
}
