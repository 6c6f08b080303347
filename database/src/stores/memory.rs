use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::VerificationCache;
use crate::{CacheKey, DatabaseError};

/// Process-local cache; lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryVerificationCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl MemoryVerificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VerificationCache for MemoryVerificationCache {
    async fn get_raw(&self, key: &CacheKey) -> Result<Option<String>, DatabaseError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_raw(&self, key: &CacheKey, payload: String) -> Result<(), DatabaseError> {
        self.entries.write().await.insert(key.clone(), payload);
        Ok(())
    }

    async fn delete_raw(&self, key: &CacheKey) -> Result<(), DatabaseError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
