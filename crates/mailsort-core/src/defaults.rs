//! Centralized default values for mailsort.
//!
//! Every tunable has exactly one definition here. Environment variables
//! (parsed in `config`) override these at startup; nothing else should
//! hard-code a threshold or a size.

// =============================================================================
// EMBEDDING MODEL
// =============================================================================

/// Default Ollama endpoint for the embedding backend.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default embedding model. Must produce [`EMBED_DIMENSION`]-sized vectors;
/// the category table's vector column is declared with the same dimension.
pub const EMBED_MODEL: &str = "all-minilm";

/// Default embedding dimension.
pub const EMBED_DIMENSION: usize = 384;

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// MATCHING THRESHOLDS
// =============================================================================

/// Minimum cosine similarity for assigning an email to an existing category.
pub const CATEGORY_MATCH_THRESHOLD: f32 = 0.7;

/// Minimum cosine similarity for the thread-consistency fast path.
pub const THREAD_CONSISTENCY_THRESHOLD: f32 = 0.5;

/// Confidence added on top of the similarity score for thread continuations.
pub const THREAD_CONFIDENCE_BOOST: f32 = 0.2;

/// Upper bound on thread-boosted confidence.
pub const THREAD_CONFIDENCE_CAP: f32 = 0.95;

/// Confidence reported for a freshly minted category.
pub const NEW_CATEGORY_CONFIDENCE: f32 = 0.8;

/// Confidence reported when categorization falls back to the general bucket.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Secondary (lower) threshold for naming a new category by embedding
/// similarity against the canonical label set.
pub const CANONICAL_EMBED_THRESHOLD: f32 = 0.4;

/// Name of the catch-all category, created on first use.
pub const GENERAL_CATEGORY: &str = "general";

// =============================================================================
// TEXT PROCESSING
// =============================================================================

/// Maximum subject length (chars) fed to the embedder.
pub const MAX_SUBJECT_CHARS: usize = 200;

/// Maximum cleaned-body length (chars) fed to the embedder.
pub const MAX_BODY_CHARS: usize = 500;

/// Stand-in text when both subject and body normalize to empty.
pub const EMPTY_TEXT_SENTINEL: &str = "General email";

// =============================================================================
// CACHES
// =============================================================================

/// Maximum number of entries in the embedding cache.
pub const EMBED_CACHE_SIZE: usize = 2000;

/// Embedding cache entry time-to-live (seconds).
pub const EMBED_CACHE_TTL_SECS: u64 = 7200;

/// Result cache entry time-to-live (seconds), both tiers.
pub const RESULT_CACHE_TTL_SECS: u64 = 7200;

// =============================================================================
// SIMILARITY SEARCH
// =============================================================================

/// Maximum number of categories the in-memory fallback will scan.
pub const MAX_CATEGORIES_TO_SCAN: i64 = 1000;

// =============================================================================
// WORKER
// =============================================================================

/// Polling interval when the job queue is empty (milliseconds).
pub const WORKER_POLL_INTERVAL_MS: u64 = 500;

/// Fixed delay before retrying after a queue/storage error (seconds).
pub const WORKER_BACKOFF_SECS: u64 = 5;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;
