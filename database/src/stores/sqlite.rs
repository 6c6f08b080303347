use async_trait::async_trait;
use sqlx::SqlitePool;

use super::VerificationCache;
use crate::{is_transient_sqlx, retry_with_backoff, CacheKey, CacheRecord, DatabaseError, RetryPolicy};

pub struct SqliteVerificationCache {
    pool: SqlitePool,
    write_policy: RetryPolicy,
}

impl SqliteVerificationCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_policy: RetryPolicy::default(),
        }
    }

    pub fn with_write_policy(mut self, write_policy: RetryPolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn record(&self, key: &CacheKey) -> Result<Option<CacheRecord>, DatabaseError> {
        sqlx::query_as::<_, CacheRecord>(
            "SELECT cache_key, payload, stored_at FROM verification_cache WHERE cache_key = ?",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM verification_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }
}

#[async_trait]
impl VerificationCache for SqliteVerificationCache {
    async fn get_raw(&self, key: &CacheKey) -> Result<Option<String>, DatabaseError> {
        let record = self.record(key).await?;
        if let Some(record) = &record {
            tracing::debug!("{} stored at {}", record.cache_key, record.stored_at);
        }
        Ok(record.map(|r| r.payload))
    }

    async fn put_raw(&self, key: &CacheKey, payload: String) -> Result<(), DatabaseError> {
        let pool = self.pool.clone();
        let key = key.as_str().to_string();
        retry_with_backoff(
            move || {
                let pool = pool.clone();
                let key = key.clone();
                let payload = payload.clone();
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO verification_cache (cache_key, payload, stored_at) VALUES (?, ?, ?)
                         ON CONFLICT(cache_key) DO UPDATE SET payload = excluded.payload, stored_at = excluded.stored_at",
                    )
                    .bind(key)
                    .bind(payload)
                    .bind(chrono::Utc::now())
                    .execute(&pool)
                    .await
                    .map(|_| ())
                })
            },
            is_transient_sqlx,
            self.write_policy,
        )
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn delete_raw(&self, key: &CacheKey) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM verification_cache WHERE cache_key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }
}
