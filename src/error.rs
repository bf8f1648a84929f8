use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// Everything the engine can reject at its boundary.
///
/// None of these are fatal: callers either re-fetch a snapshot, start a new
/// session, or (for persisted state) silently fall back to defaults.
#[derive(Debug, Error)]
pub enum GameError {
    /// The selected index does not exist in the current round.
    #[error("option {index} is out of range for a round with {len} options")]
    InvalidOption { index: usize, len: usize },

    /// An action arrived while no session is running.
    #[error("no active round; start a session first")]
    NoActiveRound,

    /// The stored baseline could not be parsed.
    #[error("persisted state is corrupted: {0}")]
    CorruptedPersistedState(String),

    /// A difficulty table that would make round generation impossible.
    #[error("invalid difficulty table: {0}")]
    InvalidDifficulty(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GameError {
    /// Short machine-readable tag, used by the headless protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidOption { .. } => "invalid_option",
            GameError::NoActiveRound => "no_active_round",
            GameError::CorruptedPersistedState(_) => "corrupted_persisted_state",
            GameError::InvalidDifficulty(_) => "invalid_difficulty",
            GameError::Io(_) => "io",
            GameError::Json(_) => "json",
        }
    }
}
