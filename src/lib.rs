// Library surface for the terminal front-end, the headless driver and integration tests.
// Keep this free of ratatui; rendering lives in the binary.
pub mod achievements;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod headless;
pub mod logging;
pub mod palette;
pub mod persistence;
pub mod rewards;
pub mod round;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod util;

/// Front-end refresh period; also the session countdown step.
pub const TICK_RATE_MS: u64 = 100;

pub use engine::{AnswerReport, Engine};
pub use error::{GameError, GameResult};
