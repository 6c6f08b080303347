use thiserror::Error;

use crate::GameStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("{0} has already been used! Try someone else.")]
    DuplicateName(String),

    #[error("{0}")]
    DomainInvalid(String),

    #[error("{0}")]
    TransientService(String),

    #[error("Cannot {operation} while {status}")]
    InvalidTransition {
        operation: &'static str,
        status: GameStatus,
    },

    #[error("Enter a player name first.")]
    EmptyName,

    #[error("Still verifying the previous name.")]
    SubmissionInFlight,

    #[error("The game was reset before verification finished.")]
    Superseded,
}

impl GameError {
    /// Everything except a contract violation by the caller can be retried
    /// by the same player.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GameError::InvalidTransition { .. })
    }
}
