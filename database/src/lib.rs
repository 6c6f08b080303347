pub mod config;
pub mod error;
pub mod key;
pub mod models;
pub mod retry;
pub mod stores;

pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use key::{CacheKey, CACHE_NAMESPACE};
pub use models::CacheRecord;
pub use retry::{is_transient_sqlx, retry_with_backoff, RetryPolicy};
pub use stores::{MemoryVerificationCache, SqliteVerificationCache, VerificationCache};

// NoopCache for when caching is not wanted: every lookup misses
pub struct NoopCache;

#[async_trait::async_trait]
impl stores::VerificationCache for NoopCache {
    async fn get_raw(&self, _key: &CacheKey) -> Result<Option<String>, DatabaseError> {
        Ok(None)
    }

    async fn put_raw(&self, _key: &CacheKey, _payload: String) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn delete_raw(&self, _key: &CacheKey) -> Result<(), DatabaseError> {
        Ok(())
    }
}
