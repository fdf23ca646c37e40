//! Caching embedder with zero-vector degradation.
//!
//! Wraps an [`EmbeddingBackend`] behind the TTL cache. Embedding never
//! fails from the caller's perspective: empty input and backend errors
//! both produce a zero vector, which downstream similarity treats as
//! matching nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use mailsort_core::{EmbeddingBackend, Result};

use crate::cache::{cache_key, EmbeddingCache};

/// The caching embedder.
pub struct Embedder {
    backend: Arc<dyn EmbeddingBackend>,
    cache: EmbeddingCache,
}

impl Embedder {
    /// Create an embedder with the default cache configuration.
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            cache: EmbeddingCache::new(),
        }
    }

    /// Create an embedder with explicit cache capacity and TTL.
    pub fn with_cache_config(
        backend: Arc<dyn EmbeddingBackend>,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            cache: EmbeddingCache::with_config(capacity, ttl),
        }
    }

    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Embed a single text.
    ///
    /// Empty (after trimming) input returns a zero vector without touching
    /// the backend or the cache. A backend failure is logged and degraded
    /// to a zero vector; the failure is not cached, so a later call retries.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return vec![0.0; self.backend.dimension()];
        }

        let key = cache_key(trimmed);
        if let Some(vector) = self.cache.get(key) {
            debug!(
                subsystem = "inference",
                component = "embedder",
                op = "embed",
                cache_hit = true,
                "Embedding served from cache"
            );
            return vector;
        }

        match self.backend.embed_texts(&[trimmed.to_string()]).await {
            Ok(mut vectors) if !vectors.is_empty() => {
                let vector = vectors.remove(0);
                self.cache.insert(key, vector.clone());
                vector
            }
            Ok(_) => {
                warn!(
                    subsystem = "inference",
                    component = "embedder",
                    op = "embed",
                    "Backend returned no vectors, degrading to zero vector"
                );
                vec![0.0; self.backend.dimension()]
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "embedder",
                    op = "embed",
                    error = %e,
                    "Embedding failed, degrading to zero vector"
                );
                vec![0.0; self.backend.dimension()]
            }
        }
    }

    /// Check backend availability.
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// Number of cached embeddings.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached embeddings.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;

    #[tokio::test]
    async fn test_empty_text_zero_vector_without_backend_call() {
        let backend = Arc::new(MockEmbeddingBackend::new().with_dimension(8));
        let embedder = Embedder::new(backend.clone());

        let vector = embedder.embed("   ").await;
        assert_eq!(vector, vec![0.0; 8]);
        assert_eq!(backend.embed_call_count(), 0);
        assert_eq!(embedder.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let embedder = Embedder::new(backend.clone());

        let first = embedder.embed("invoice payment").await;
        let second = embedder.embed("invoice payment").await;

        assert_eq!(first, second);
        assert_eq!(backend.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_variants_share_cache_entry() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let embedder = Embedder::new(backend.clone());

        embedder.embed("invoice").await;
        embedder.embed("  invoice ").await;

        assert_eq!(backend.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_zero_vector() {
        let backend = Arc::new(MockEmbeddingBackend::new().with_dimension(4).with_failure());
        let embedder = Embedder::new(backend.clone());

        let vector = embedder.embed("invoice").await;
        assert_eq!(vector, vec![0.0; 4]);
        // Failure was not cached, a later call hits the backend again
        embedder.embed("invoice").await;
        assert_eq!(backend.embed_call_count(), 2);
    }
}
