//! Contract tests run against every VerificationCache implementation.

use std::sync::Arc;

use database::{
    CacheKey, DatabaseConfig, MemoryVerificationCache, NoopCache, SqliteVerificationCache,
    VerificationCache,
};
use types::VerificationResult;

async fn sqlite_cache() -> SqliteVerificationCache {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        pool_size: 1,
    };
    let pool = config.create_pool().await.expect("Failed to connect");
    let cache = SqliteVerificationCache::new(pool);
    cache.run_migrations().await.expect("Failed to migrate");
    cache
}

async fn all_caches() -> Vec<(&'static str, Box<dyn VerificationCache>)> {
    vec![
        ("memory", Box::new(MemoryVerificationCache::new()) as Box<dyn VerificationCache>),
        ("sqlite", Box::new(sqlite_cache().await) as Box<dyn VerificationCache>),
    ]
}

/// Two lookups after one store return the same answer
#[tokio::test]
async fn test_lookup_is_idempotent() {
    for (name, cache) in all_caches().await {
        let result = VerificationResult::Valid {
            appearances: 669,
            source_url: Some("https://example.org/adams".to_string()),
        };
        cache.store("Tony Adams", "Arsenal", &result).await.unwrap();

        let first = cache.lookup("Tony Adams", "Arsenal").await.unwrap();
        let second = cache.lookup("Tony Adams", "Arsenal").await.unwrap();
        assert_eq!(first, Some(result.clone()), "{name}");
        assert_eq!(first, second, "{name}");
    }
}

/// Invalid answers are facts too and come back verbatim
#[tokio::test]
async fn test_invalid_results_are_cached() {
    for (name, cache) in all_caches().await {
        let result = VerificationResult::invalid("Never played for Everton");
        cache.store("Pele", "Everton", &result).await.unwrap();
        assert_eq!(
            cache.lookup("pele", "everton").await.unwrap(),
            Some(result),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_miss_for_other_club() {
    for (name, cache) in all_caches().await {
        cache
            .store("Sol Campbell", "Arsenal", &VerificationResult::valid(197))
            .await
            .unwrap();
        assert_eq!(
            cache.lookup("Sol Campbell", "Tottenham Hotspur").await.unwrap(),
            None,
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_corrupt_payload_is_removed() {
    for (name, cache) in all_caches().await {
        let key = CacheKey::new("Dennis Bergkamp", "Arsenal");
        cache.put_raw(&key, "{\"outcome\":".to_string()).await.unwrap();

        assert_eq!(
            cache.lookup("Dennis Bergkamp", "Arsenal").await.unwrap(),
            None,
            "{name}"
        );
        assert_eq!(cache.get_raw(&key).await.unwrap(), None, "{name}");

        // a later store works normally
        cache
            .store("Dennis Bergkamp", "Arsenal", &VerificationResult::valid(423))
            .await
            .unwrap();
        assert_eq!(
            cache.lookup("Dennis Bergkamp", "Arsenal").await.unwrap(),
            Some(VerificationResult::valid(423)),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_shared_cache_across_tasks() {
    let cache: Arc<dyn VerificationCache> = Arc::new(MemoryVerificationCache::new());

    let handles: Vec<_> = ["Tony Adams", "Ian Wright", "Robert Pires", "Freddie Ljungberg"]
        .into_iter()
        .enumerate()
        .map(|(idx, player)| {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .store(player, "Arsenal", &VerificationResult::valid(idx as u32 + 1))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        cache.lookup("Robert Pires", "Arsenal").await.unwrap(),
        Some(VerificationResult::valid(3))
    );
}

#[tokio::test]
async fn test_noop_cache_never_hits() {
    let cache = NoopCache;
    cache
        .store("Tony Adams", "Arsenal", &VerificationResult::valid(669))
        .await
        .expect("NoopCache should always succeed");
    assert_eq!(cache.lookup("Tony Adams", "Arsenal").await.unwrap(), None);
    cache
        .invalidate("Tony Adams", "Arsenal")
        .await
        .expect("NoopCache should always succeed");
}

#[tokio::test]
async fn test_file_cache_survives_reopen() {
    let path = std::env::temp_dir().join(format!(
        "verification-cache-{}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let config = DatabaseConfig::from_cli_or_env_or_yaml(
        Some(path.to_string_lossy().to_string()),
        None,
    );

    {
        let cache = SqliteVerificationCache::new(config.create_pool().await.unwrap());
        cache.run_migrations().await.unwrap();
        cache
            .store("Thierry Henry", "Arsenal", &VerificationResult::valid(377))
            .await
            .unwrap();
        cache.pool().close().await;
    }

    let cache = SqliteVerificationCache::new(config.create_pool().await.unwrap());
    cache.run_migrations().await.unwrap();
    assert_eq!(
        cache.lookup("thierry henry", "ARSENAL").await.unwrap(),
        Some(VerificationResult::valid(377))
    );
    cache.pool().close().await;
    let _ = std::fs::remove_file(&path);
}
