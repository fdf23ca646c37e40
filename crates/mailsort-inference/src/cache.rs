//! Bounded TTL cache for embedding vectors.
//!
//! Keys are 64-bit hashes of the trimmed input text. Expiry is lazy: an
//! entry past its TTL is dropped on the read that finds it. When the cache
//! is full, the entry inserted earliest is evicted, whether or not it has
//! expired.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use mailsort_core::defaults;

struct Entry {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// Thread-safe embedding cache with bounded capacity and TTL.
pub struct EmbeddingCache {
    entries: Mutex<HashMap<u64, Entry>>,
    capacity: usize,
    ttl: Duration,
}

/// Hash a text to its cache key. Leading/trailing whitespace does not
/// change the key.
pub fn cache_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.trim().hash(&mut hasher);
    hasher.finish()
}

impl EmbeddingCache {
    /// Create a cache with the default capacity and TTL.
    pub fn new() -> Self {
        Self::with_config(
            defaults::EMBED_CACHE_SIZE,
            Duration::from_secs(defaults::EMBED_CACHE_TTL_SECS),
        )
    }

    /// Create a cache with explicit capacity and TTL.
    pub fn with_config(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up a vector by key, dropping it if expired.
    pub fn get(&self, key: u64) -> Option<Vec<f32>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.vector.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Insert a vector, evicting the oldest entry when at capacity.
    pub fn insert(&self, key: u64, vector: Vec<f32>) {
        let mut entries = self.entries.lock().unwrap();

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| *k);
            if let Some(oldest_key) = oldest {
                entries.remove(&oldest_key);
                debug!(
                    subsystem = "inference",
                    component = "embed_cache",
                    op = "evict",
                    "Evicted oldest cache entry at capacity"
                );
            }
        }

        entries.insert(
            key,
            Entry {
                vector,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of cached entries (including not-yet-collected expired ones).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_trims_whitespace() {
        assert_eq!(cache_key("hello"), cache_key("  hello  "));
        assert_ne!(cache_key("hello"), cache_key("world"));
    }

    #[test]
    fn test_insert_and_get() {
        let cache = EmbeddingCache::with_config(10, Duration::from_secs(60));
        let key = cache_key("invoice");
        cache.insert(key, vec![1.0, 2.0]);
        assert_eq!(cache.get(key), Some(vec![1.0, 2.0]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_dropped_on_read() {
        let cache = EmbeddingCache::with_config(10, Duration::from_millis(0));
        let key = cache_key("invoice");
        cache.insert(key, vec![1.0]);
        assert_eq!(cache.get(key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = EmbeddingCache::with_config(2, Duration::from_secs(60));
        let k1 = cache_key("first");
        let k2 = cache_key("second");
        let k3 = cache_key("third");

        cache.insert(k1, vec![1.0]);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(k2, vec![2.0]);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(k3, vec![3.0]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(k1), None);
        assert!(cache.get(k2).is_some());
        assert!(cache.get(k3).is_some());
    }

    #[test]
    fn test_reinsert_existing_key_does_not_evict() {
        let cache = EmbeddingCache::with_config(2, Duration::from_secs(60));
        let k1 = cache_key("first");
        let k2 = cache_key("second");

        cache.insert(k1, vec![1.0]);
        cache.insert(k2, vec![2.0]);
        cache.insert(k1, vec![9.0]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(k1), Some(vec![9.0]));
        assert!(cache.get(k2).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = EmbeddingCache::with_config(10, Duration::from_secs(60));
        cache.insert(cache_key("a"), vec![1.0]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
