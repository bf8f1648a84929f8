mod ui;

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use stroop_rush::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{ConfigStore, FileConfigStore, GameConfig},
    engine::Engine,
    evaluator::Outcome,
    headless::HeadlessDriver,
    logging::{init_logging, LogTarget},
    persistence::FileBaselineStore,
    rewards::RewardKind,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::SessionPhase,
    util::encode_component,
    GameError,
};
use webbrowser::Browser;

/// fast-paced color/word reaction game: pick the right ink before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A Stroop-effect reaction game for the terminal. Pick the option matching the prompt, build combos for double score, shields and bonus time, and keep up as the levels add colors and options."
)]
pub struct Cli {
    /// number of seconds on the clock at the start of a session
    #[clap(short = 's', long)]
    seconds: Option<f64>,

    /// seed for round generation, for reproducible sessions
    #[clap(long)]
    seed: Option<u64>,

    /// chance (0.0 - 1.0) of an advanced round from level 2 on
    #[clap(short = 'a', long, value_parser = parse_chance)]
    advanced_chance: Option<f64>,

    /// start with the debug override on: every answer counts as correct
    #[clap(long)]
    debug: bool,

    /// serve the JSON-lines automation protocol on stdin/stdout instead of the TUI
    #[clap(long)]
    headless: bool,

    /// path to a JSON config file (default: platform config dir)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// path to the best-score baseline file (default: platform state dir)
    #[clap(short = 'b', long)]
    baseline: Option<PathBuf>,

    /// write logs to this file
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn parse_chance(s: &str) -> Result<f64, String> {
    let chance: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&chance) {
        Ok(chance)
    } else {
        Err(format!("`{s}` is not between 0.0 and 1.0"))
    }
}

impl Cli {
    /// Command line flags win over the config file.
    fn apply(&self, mut cfg: GameConfig) -> GameConfig {
        if let Some(seconds) = self.seconds {
            cfg.initial_time_secs = seconds;
        }
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(chance) = self.advanced_chance {
            cfg.advanced_probability = chance;
        }
        cfg
    }

    fn log_target(&self) -> LogTarget {
        if self.headless {
            LogTarget::Stderr
        } else if let Some(path) = &self.log_file {
            LogTarget::File(path.clone())
        } else if self.verbose > 0 {
            LogTarget::File(AppDirs::log_path().unwrap_or_else(|| PathBuf::from("stroop-rush.log")))
        } else {
            LogTarget::Off
        }
    }

    fn build_engine(&self) -> Engine {
        let config_store = self
            .config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default();
        let baseline_store = self
            .baseline
            .as_ref()
            .map(FileBaselineStore::with_path)
            .unwrap_or_default();

        let mut engine = Engine::new(self.apply(config_store.load())).with_store(baseline_store);
        if self.debug {
            engine.set_debug(true);
        }
        engine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Playing,
    Results,
    Achievements,
}

/// What the last click did, for the feedback line.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub outcome: Outcome,
    pub gained: u32,
    pub rewards: Vec<RewardKind>,
    pub immunity_consumed: bool,
    pub leveled_up: bool,
}

pub struct App<C: Clock = SystemClock> {
    pub engine: Engine<C>,
    pub state: AppState,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitType {
    Continue,
    Quit,
}

impl<C: Clock> App<C> {
    pub fn new(engine: Engine<C>) -> Self {
        Self {
            engine,
            state: AppState::Menu,
            feedback: None,
        }
    }

    fn start(&mut self) {
        self.engine.start_session();
        self.feedback = None;
        self.state = AppState::Playing;
    }

    fn to_menu(&mut self) {
        self.engine.abandon_session();
        self.feedback = None;
        self.state = AppState::Menu;
    }

    /// Let due timers fire; moves to the results screen when time runs out.
    pub fn on_tick(&mut self) {
        if self.engine.pump() == SessionPhase::Finished && self.state == AppState::Playing {
            self.state = AppState::Results;
        }
    }

    fn answer(&mut self, index: usize) {
        let score_before = self.engine.get_snapshot().score;
        match self.engine.submit_answer(index) {
            Ok(report) => {
                self.feedback = Some(Feedback {
                    outcome: report.outcome,
                    gained: report.snapshot.score.saturating_sub(score_before),
                    rewards: report.rewards_fired,
                    immunity_consumed: report.immunity_consumed,
                    leveled_up: report.leveled_up,
                });
            }
            Err(GameError::InvalidOption { index, len }) => {
                tracing::debug!(index, len, "ignoring key for a missing option");
            }
            Err(err) => tracing::debug!(error = %err, "answer rejected"),
        }
        if self.engine.phase() == SessionPhase::Finished {
            self.state = AppState::Results;
        }
    }

    pub fn share_url(&self) -> Option<String> {
        self.engine.last_result().map(|result| {
            format!(
                "https://twitter.com/intent/tweet?text={}",
                encode_component(&result.share_text())
            )
        })
    }

    fn on_key(&mut self, key: KeyEvent) -> ExitType {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.engine.abandon_session();
            return ExitType::Quit;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.engine.toggle_debug();
                }
                KeyCode::Char('a') => self.state = AppState::Achievements,
                KeyCode::Char('q') | KeyCode::Esc => return ExitType::Quit,
                _ => {}
            },
            AppState::Achievements => match key.code {
                KeyCode::Char('a') | KeyCode::Char('m') | KeyCode::Esc => {
                    self.state = AppState::Menu
                }
                KeyCode::Char('q') => return ExitType::Quit,
                _ => {}
            },
            AppState::Playing => match key.code {
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    self.answer(index);
                }
                KeyCode::Esc => self.to_menu(),
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.start(),
                KeyCode::Char('t') => {
                    if let Some(url) = self.share_url() {
                        if Browser::is_available() {
                            webbrowser::open(&url).unwrap_or_default();
                        }
                    }
                }
                KeyCode::Char('m') | KeyCode::Esc => self.to_menu(),
                KeyCode::Char('q') => return ExitType::Quit,
                _ => {}
            },
        }
        ExitType::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_target(), cli.verbose) {
        eprintln!("could not set up logging: {err}");
    }

    let engine = cli.build_engine();

    if cli.headless {
        let mut driver = HeadlessDriver::new(engine);
        driver.run(stdin().lock(), io::stdout().lock())?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty (use --headless for automation)")
            .exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                app.on_tick();
                if app.state == AppState::Playing || app.state == AppState::Results {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            GameEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            GameEvent::Key(key) => {
                if app.on_key(key) == ExitType::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroop_rush::clock::ManualClock;
    use stroop_rush::persistence::MemoryBaselineStore;

    fn test_app() -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = Engine::with_clock(GameConfig::default().with_seed(5), clock.clone())
            .with_store(MemoryBaselineStore::default());
        (App::new(engine), clock)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["stroop-rush"]);
        assert_eq!(cli.seconds, None);
        assert_eq!(cli.seed, None);
        assert!(!cli.debug);
        assert!(!cli.headless);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.log_target(), LogTarget::Off);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["stroop-rush", "-s", "45", "--seed", "9", "-a", "0.25"]);
        let cfg = cli.apply(GameConfig::default());
        assert_eq!(cfg.initial_time_secs, 45.0);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.advanced_probability, 0.25);
        assert_eq!(cfg.base_score, 10);
    }

    #[test]
    fn test_cli_rejects_bad_chances() {
        for bad in ["NaN", "1.5", "-0.1", "inf", "lots"] {
            assert!(Cli::try_parse_from(["stroop-rush", "-a", bad]).is_err(), "{bad}");
        }
        let cli = Cli::try_parse_from(["stroop-rush", "-a", "1"]).unwrap();
        assert_eq!(cli.advanced_chance, Some(1.0));
    }

    #[test]
    fn test_cli_verbosity_and_log_target() {
        let cli = Cli::parse_from(["stroop-rush", "-vv", "--log-file", "/tmp/x.log"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_target(), LogTarget::File(PathBuf::from("/tmp/x.log")));

        let cli = Cli::parse_from(["stroop-rush", "--headless"]);
        assert_eq!(cli.log_target(), LogTarget::Stderr);
    }

    #[test]
    fn test_menu_enter_starts_playing() {
        let (mut app, _) = test_app();
        assert_eq!(app.state, AppState::Menu);
        assert_eq!(app.on_key(key(KeyCode::Enter)), ExitType::Continue);
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.engine.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_ctrl_d_toggles_debug_on_menu() {
        let (mut app, _) = test_app();
        app.on_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert!(app.engine.debug());
    }

    #[test]
    fn test_number_keys_answer() {
        let (mut app, _) = test_app();
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char('1')));
        assert!(app.feedback.is_some());
        assert_eq!(app.engine.get_snapshot().total_clicks, 1);

        // level one has four options
        app.on_key(key(KeyCode::Char('9')));
        assert_eq!(app.engine.get_snapshot().total_clicks, 1);
    }

    #[test]
    fn test_escape_abandons_to_menu() {
        let (mut app, _) = test_app();
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Menu);
        assert_eq!(app.engine.phase(), SessionPhase::Idle);
        assert_eq!(app.engine.live_timers(), 0);
    }

    #[test]
    fn test_time_out_moves_to_results() {
        let (mut app, clock) = test_app();
        app.on_key(key(KeyCode::Enter));
        clock.advance_ms(30_000);
        app.on_tick();
        assert_eq!(app.state, AppState::Results);
        assert!(app.share_url().unwrap().starts_with("https://twitter.com/intent/tweet?text=I%20scored"));

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Playing);
    }

    #[test]
    fn test_achievements_screen_from_menu() {
        let (mut app, _) = test_app();
        app.on_key(key(KeyCode::Char('a')));
        assert_eq!(app.state, AppState::Achievements);
        // number keys do nothing here
        app.on_key(key(KeyCode::Char('1')));
        assert_eq!(app.engine.phase(), SessionPhase::Idle);

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Menu);

        app.on_key(key(KeyCode::Char('a')));
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), ExitType::Quit);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = test_app();
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), ExitType::Quit);

        let (mut app, _) = test_app();
        app.on_key(key(KeyCode::Enter));
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            ExitType::Quit
        );
        assert_eq!(app.engine.phase(), SessionPhase::Idle);
    }
}
