//! Two-tier categorization result cache.
//!
//! The memory tier is authoritative while an entry is unexpired; the
//! durable tier survives restarts. A durable hit is promoted back into
//! memory. Entries are immutable until they expire or a fresh write
//! overwrites them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use mailsort_core::{defaults, Categorization, Result, ResultCacheStore};

/// Result cache with an in-memory fast path over a durable store.
pub struct TwoTierResultCache {
    memory: Mutex<HashMap<String, (Categorization, Instant)>>,
    durable: Arc<dyn ResultCacheStore>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TwoTierResultCache {
    /// Create a cache with the default TTL.
    pub fn new(durable: Arc<dyn ResultCacheStore>) -> Self {
        Self::with_ttl(durable, Duration::from_secs(defaults::RESULT_CACHE_TTL_SECS))
    }

    /// Create a cache with an explicit TTL (applies to both tiers).
    pub fn with_ttl(durable: Arc<dyn ResultCacheStore>, ttl: Duration) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            durable,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Write a result under `key` into both tiers.
    pub async fn put(&self, key: &str, result: &Categorization) -> Result<()> {
        let value = serde_json::to_value(result)?;
        self.durable.put(key, value, self.ttl).await?;

        self.memory
            .lock()
            .unwrap()
            .insert(key.to_string(), (result.clone(), Instant::now() + self.ttl));
        Ok(())
    }

    /// Look up a result. Checks memory first, then the durable tier,
    /// promoting durable hits into memory. Every lookup counts as a hit
    /// or a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Categorization>> {
        {
            let mut memory = self.memory.lock().unwrap();
            match memory.get(key) {
                Some((result, expires)) if *expires > Instant::now() => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(result.clone()));
                }
                Some(_) => {
                    memory.remove(key);
                }
                None => {}
            }
        }

        if let Some(value) = self.durable.get(key).await? {
            let result: Categorization = serde_json::from_value(value)?;
            self.memory
                .lock()
                .unwrap()
                .insert(key.to_string(), (result.clone(), Instant::now() + self.ttl));
            debug!(
                subsystem = "jobs",
                component = "result_cache",
                op = "promote",
                "Durable hit promoted to memory tier"
            );
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(result));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    /// Total lookup hits across both tiers.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total lookup misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Remove expired durable entries.
    pub async fn purge_expired(&self) -> Result<u64> {
        self.durable.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailsort_db::test_fixtures::InMemoryResultCacheStore;

    fn result(email_id: &str) -> Categorization {
        Categorization {
            email_id: email_id.to_string(),
            user_id: "u1".to_string(),
            assigned_category: "finance".to_string(),
            confidence_score: 0.9,
            is_new_category: false,
            processing_timestamp: Utc::now(),
            category_description: None,
        }
    }

    fn cache() -> TwoTierResultCache {
        TwoTierResultCache::with_ttl(
            Arc::new(InMemoryResultCacheStore::new()),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_put_then_get_is_memory_hit() {
        let cache = cache();
        cache.put("e1", &result("e1")).await.unwrap();

        let found = cache.get("e1").await.unwrap().unwrap();
        assert_eq!(found.email_id, "e1");
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 0);
    }

    #[tokio::test]
    async fn test_miss_counted() {
        let cache = cache();
        assert!(cache.get("absent").await.unwrap().is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn test_durable_hit_promoted() {
        let durable = Arc::new(InMemoryResultCacheStore::new());
        let cache = TwoTierResultCache::with_ttl(durable.clone(), Duration::from_secs(60));

        // Write through another cache instance: only the durable tier has it
        let other = TwoTierResultCache::with_ttl(durable, Duration::from_secs(60));
        other.put("e1", &result("e1")).await.unwrap();

        let found = cache.get("e1").await.unwrap().unwrap();
        assert_eq!(found.email_id, "e1");
        assert_eq!(cache.hits(), 1);

        // Promoted: a second read is served from memory
        assert!(cache.memory.lock().unwrap().contains_key("e1"));
    }

    #[tokio::test]
    async fn test_expired_memory_entry_invisible() {
        let durable = Arc::new(InMemoryResultCacheStore::new());
        let cache = TwoTierResultCache::with_ttl(durable, Duration::from_millis(0));
        cache.put("e1", &result("e1")).await.unwrap();

        assert!(cache.get("e1").await.unwrap().is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_supersedes() {
        let cache = cache();
        cache.put("e1", &result("e1")).await.unwrap();

        let mut updated = result("e1");
        updated.assigned_category = "travel".to_string();
        cache.put("e1", &updated).await.unwrap();

        let found = cache.get("e1").await.unwrap().unwrap();
        assert_eq!(found.assigned_category, "travel");
    }
}
