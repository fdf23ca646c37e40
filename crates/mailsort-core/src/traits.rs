//! Trait definitions for repositories and backends.
//!
//! These traits define the seams between the categorization engine and its
//! collaborators. Production implementations live in `mailsort-db` and
//! `mailsort-inference`; in-memory doubles for tests live in
//! `mailsort_db::test_fixtures`.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{Category, Job, JobKind, QueueStats};
use crate::Result;

// =============================================================================
// CATEGORY PERSISTENCE
// =============================================================================

/// Repository for category CRUD and similarity lookups.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category. The caller is expected to pass a canonical
    /// (lower-case, trimmed) name; uniqueness is case-insensitive.
    async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        embedding: Option<&[f32]>,
        sample_content: Option<&str>,
    ) -> Result<Category>;

    /// Get a category by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    /// Get a category by name, case-insensitively.
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// List categories in insertion order.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Category>>;

    /// Total number of categories.
    async fn count(&self) -> Result<i64>;

    /// Number of categories that have an embedding.
    async fn count_with_embeddings(&self) -> Result<i64>;

    /// Add `delta` to a category's email count.
    async fn increment_count(&self, id: Uuid, delta: i64) -> Result<()>;

    /// Overwrite a category's embedding.
    async fn update_embedding(&self, id: Uuid, embedding: &[f32]) -> Result<()>;

    /// Probe whether the backing store supports a native nearest-neighbor
    /// vector operator. Callers cache the answer at construction.
    async fn supports_native_search(&self) -> Result<bool>;

    /// Native nearest-neighbor search. Returns (category, similarity) pairs
    /// with similarity ≥ `threshold`, descending, at most `limit`.
    ///
    /// Errors when the backend has no native operator; callers fall back to
    /// an in-memory scan.
    async fn find_similar_native(
        &self,
        query: &[f32],
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<(Category, f32)>>;
}

// =============================================================================
// JOB QUEUE
// =============================================================================

/// Repository for the durable categorization job queue.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persist a new job in `Queued` status and return its id.
    async fn queue(&self, kind: JobKind, payload: JsonValue) -> Result<Uuid>;

    /// Atomically claim the oldest queued job, marking it `Processing`.
    /// Returns `None` when the queue is empty.
    async fn claim_next(&self) -> Result<Option<Job>>;

    /// Mark a job completed with its result payload.
    async fn complete(&self, id: Uuid, result: JsonValue) -> Result<()>;

    /// Mark a job failed with an error message. Failed jobs are terminal
    /// and never requeued.
    async fn fail(&self, id: Uuid, error: &str) -> Result<()>;

    /// Look up a job by id. Absent jobs are `None`, never a default status.
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Queue statistics summary.
    async fn stats(&self) -> Result<QueueStats>;

    /// Delete all terminal (completed/failed) job records. Returns the
    /// number of rows removed.
    async fn clear_terminal(&self) -> Result<u64>;
}

// =============================================================================
// DURABLE RESULT CACHE
// =============================================================================

/// Durable tier of the two-tier result cache.
///
/// A value written under a key is immutable until it expires or is
/// superseded by a fresh write under the same key.
#[async_trait]
pub trait ResultCacheStore: Send + Sync {
    /// Write (or overwrite) a value with the given time-to-live.
    async fn put(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<()>;

    /// Read a value; expired entries are treated as absent.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>>;

    /// Remove expired entries. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64>;
}

// =============================================================================
// EMBEDDING BACKEND
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// The model name being used.
    fn model_name(&self) -> &str;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}
