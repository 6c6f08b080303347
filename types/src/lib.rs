pub mod club;
pub mod entry;
pub mod error;
pub mod game_state;
pub mod oracle;
pub mod player;
pub mod verification;

pub use club::Club;
pub use entry::PlayerEntry;
pub use error::GameError;
pub use game_state::{GameState, GameStatus, Outcome, TurnOutcome, TARGET_SCORE};
pub use oracle::{Oracle, OracleError};
pub use player::Seat;
pub use verification::{OracleResponse, VerificationResult, SERVICE_BUSY_MESSAGE};
