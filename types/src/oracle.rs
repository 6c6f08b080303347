use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::OracleResponse;

/// Failures that say something about the oracle, not about the player.
/// These are never cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Oracle: Debug + Send + Sync {
    async fn verify(
        &self,
        player_name: &str,
        club_name: &str,
    ) -> Result<OracleResponse, OracleError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
