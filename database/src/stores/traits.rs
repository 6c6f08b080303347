use async_trait::async_trait;
use types::VerificationResult;

use crate::{CacheKey, DatabaseError};

/// A permanent fact cache of verification answers keyed by (player, club).
///
/// Implementors only provide raw string storage; key derivation, encoding
/// and the handling of unreadable entries live in the provided methods.
#[async_trait]
pub trait VerificationCache: Send + Sync {
    async fn get_raw(&self, key: &CacheKey) -> Result<Option<String>, DatabaseError>;
    async fn put_raw(&self, key: &CacheKey, payload: String) -> Result<(), DatabaseError>;
    async fn delete_raw(&self, key: &CacheKey) -> Result<(), DatabaseError>;

    /// Returns the stored answer, or `None` on a miss. An entry that no
    /// longer decodes is removed and reported as a miss.
    async fn lookup(
        &self,
        player_name: &str,
        club_name: &str,
    ) -> Result<Option<VerificationResult>, DatabaseError> {
        let key = CacheKey::new(player_name, club_name);
        let Some(payload) = self.get_raw(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<VerificationResult>(&payload) {
            Ok(result) if result.is_well_formed() => {
                tracing::debug!("Cache hit for {player_name} at {club_name}");
                Ok(Some(result))
            }
            Ok(_) => {
                tracing::warn!("Dropping ill-formed cache entry {key}: {payload}");
                self.delete_raw(&key).await?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Dropping unreadable cache entry {key}: {e}");
                self.delete_raw(&key).await?;
                Ok(None)
            }
        }
    }

    /// Only conclusive answers belong here; transient oracle failures are
    /// not `VerificationResult`s and cannot be stored.
    async fn store(
        &self,
        player_name: &str,
        club_name: &str,
        result: &VerificationResult,
    ) -> Result<(), DatabaseError> {
        if !result.is_well_formed() {
            return Err(DatabaseError::MalformedResult(format!("{result:?}")));
        }
        let key = CacheKey::new(player_name, club_name);
        let payload = serde_json::to_string(result)?;
        self.put_raw(&key, payload).await?;
        tracing::debug!("Cached {key}");
        Ok(())
    }

    async fn invalidate(&self, player_name: &str, club_name: &str) -> Result<(), DatabaseError> {
        let key = CacheKey::new(player_name, club_name);
        self.delete_raw(&key).await
    }
}
