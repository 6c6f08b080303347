use serde::{Deserialize, Serialize};

/// One row of the `verification_cache` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CacheRecord {
    pub cache_key: String,
    pub payload: String,
    pub stored_at: chrono::DateTime<chrono::Utc>,
}
