use crate::domain::FilterKind;

/// Core error type for the quiz bot.
///
/// Adapter crates map these into user-facing replies. Variants that a player
/// can trigger by normal play are reported by [`Error::is_user_facing`]; the
/// rest (storage, config) are hard failures that should be logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("external error: {0}")]
    External(String),

    #[error("no free rounds left today")]
    NoFreeRounds,

    #[error("no questions match the selected filters")]
    EmptyPool,

    #[error("unknown {kind}: {value}")]
    InvalidFilter { kind: FilterKind, value: String },

    #[error("a round is already in progress")]
    RoundInProgress,

    #[error("no active round")]
    NoActiveRound,

    #[error("answer does not match the pending question")]
    SessionMismatch,

    #[error("daily bonus already claimed today")]
    AlreadyClaimed,
}

impl Error {
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NoFreeRounds
                | Error::EmptyPool
                | Error::InvalidFilter { .. }
                | Error::RoundInProgress
                | Error::NoActiveRound
                | Error::SessionMismatch
                | Error::AlreadyClaimed
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
