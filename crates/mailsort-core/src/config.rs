//! Runtime configuration for the categorization service.

use crate::defaults;

/// Tunable thresholds and limits, loaded from the environment with
/// defaults from [`crate::defaults`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Minimum similarity for assigning to an existing category.
    pub category_match_threshold: f32,
    /// Minimum similarity for the thread-consistency fast path.
    pub thread_consistency_threshold: f32,
    /// Confidence boost applied on thread continuations.
    pub thread_confidence_boost: f32,
    /// Secondary threshold for canonical-label embedding fallback.
    pub canonical_embed_threshold: f32,
    /// Maximum subject length (chars) fed to the embedder.
    pub max_subject_chars: usize,
    /// Maximum cleaned-body length (chars) fed to the embedder.
    pub max_body_chars: usize,
    /// Embedding cache capacity (entries).
    pub embed_cache_size: usize,
    /// Embedding cache TTL (seconds).
    pub embed_cache_ttl_secs: u64,
    /// Result cache TTL (seconds), both tiers.
    pub result_cache_ttl_secs: u64,
    /// Maximum categories scanned by the in-memory fallback.
    pub max_categories_to_scan: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            category_match_threshold: defaults::CATEGORY_MATCH_THRESHOLD,
            thread_consistency_threshold: defaults::THREAD_CONSISTENCY_THRESHOLD,
            thread_confidence_boost: defaults::THREAD_CONFIDENCE_BOOST,
            canonical_embed_threshold: defaults::CANONICAL_EMBED_THRESHOLD,
            max_subject_chars: defaults::MAX_SUBJECT_CHARS,
            max_body_chars: defaults::MAX_BODY_CHARS,
            embed_cache_size: defaults::EMBED_CACHE_SIZE,
            embed_cache_ttl_secs: defaults::EMBED_CACHE_TTL_SECS,
            result_cache_ttl_secs: defaults::RESULT_CACHE_TTL_SECS,
            max_categories_to_scan: defaults::MAX_CATEGORIES_TO_SCAN,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl ServiceConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CATEGORY_MATCH_THRESHOLD` | `0.7` |
    /// | `THREAD_CONSISTENCY_THRESHOLD` | `0.5` |
    /// | `THREAD_CONFIDENCE_BOOST` | `0.2` |
    /// | `CANONICAL_EMBED_THRESHOLD` | `0.4` |
    /// | `MAX_SUBJECT_CHARS` | `200` |
    /// | `MAX_BODY_CHARS` | `500` |
    /// | `EMBED_CACHE_SIZE` | `2000` |
    /// | `EMBED_CACHE_TTL_SECS` | `7200` |
    /// | `RESULT_CACHE_TTL_SECS` | `7200` |
    /// | `MAX_CATEGORIES_TO_SCAN` | `1000` |
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            category_match_threshold: env_parse(
                "CATEGORY_MATCH_THRESHOLD",
                d.category_match_threshold,
            ),
            thread_consistency_threshold: env_parse(
                "THREAD_CONSISTENCY_THRESHOLD",
                d.thread_consistency_threshold,
            ),
            thread_confidence_boost: env_parse(
                "THREAD_CONFIDENCE_BOOST",
                d.thread_confidence_boost,
            ),
            canonical_embed_threshold: env_parse(
                "CANONICAL_EMBED_THRESHOLD",
                d.canonical_embed_threshold,
            ),
            max_subject_chars: env_parse("MAX_SUBJECT_CHARS", d.max_subject_chars),
            max_body_chars: env_parse("MAX_BODY_CHARS", d.max_body_chars),
            embed_cache_size: env_parse("EMBED_CACHE_SIZE", d.embed_cache_size),
            embed_cache_ttl_secs: env_parse("EMBED_CACHE_TTL_SECS", d.embed_cache_ttl_secs),
            result_cache_ttl_secs: env_parse("RESULT_CACHE_TTL_SECS", d.result_cache_ttl_secs),
            max_categories_to_scan: env_parse(
                "MAX_CATEGORIES_TO_SCAN",
                d.max_categories_to_scan,
            ),
        }
    }

    /// Set the category-match threshold.
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.category_match_threshold = threshold;
        self
    }

    /// Set the thread-consistency threshold.
    pub fn with_thread_threshold(mut self, threshold: f32) -> Self {
        self.thread_consistency_threshold = threshold;
        self
    }

    /// Set the maximum in-memory scan size.
    pub fn with_max_scan(mut self, max: i64) -> Self {
        self.max_categories_to_scan = max;
        self
    }
}
