//! Structured logging schema and field name constants for mailsort.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (scan hits, cache ops) |

// =============================================================================
// IDENTITY FIELDS
// =============================================================================

/// Subsystem originating the log event.
/// Values: "engine", "match", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "matcher", "embedder", "pool", "worker", "result_cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "categorize", "find_similar", "embed", "claim_next"
pub const OPERATION: &str = "op";

// =============================================================================
// ENTITY FIELDS
// =============================================================================

/// Email identifier being categorized.
pub const EMAIL_ID: &str = "email_id";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Category UUID being operated on.
pub const CATEGORY_ID: &str = "category_id";

/// Category name (canonical, lower-case).
pub const CATEGORY_NAME: &str = "category_name";

// =============================================================================
// MEASUREMENT FIELDS
// =============================================================================

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a similarity search.
pub const RESULT_COUNT: &str = "result_count";

/// Similarity score of the best match.
pub const SCORE: &str = "score";

/// Search strategy in effect ("pgvector", "in_memory").
pub const STRATEGY: &str = "strategy";

// =============================================================================
// OUTCOME FIELDS
// =============================================================================

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
