//! Core data models for mailsort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A persistent email category with its centroid embedding.
///
/// `name` is canonical (lower-case, trimmed) and unique case-insensitively.
/// `embedding` may be absent for categories created before embeddings were
/// backfilled; similarity search skips those with a logged warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub email_count: i64,
    pub sample_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A standalone email submitted for categorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneEmail {
    pub email_id: String,
    pub user_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub snippet: Option<String>,
    pub sender_email: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// An email that is part of a known conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadedEmail {
    pub email_id: String,
    pub user_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub snippet: Option<String>,
    pub sender_email: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub thread_id: String,
    #[serde(default)]
    pub thread_subject: String,
    pub previous_category: Option<String>,
    pub previous_email_snippet: Option<String>,
    #[serde(default)]
    pub thread_email_count: i64,
}

impl ThreadedEmail {
    /// Drop the thread context, leaving a standalone request.
    pub fn to_standalone(&self) -> StandaloneEmail {
        StandaloneEmail {
            email_id: self.email_id.clone(),
            user_id: self.user_id.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            snippet: self.snippet.clone(),
            sender_email: self.sender_email.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// The outcome of categorizing one email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categorization {
    pub email_id: String,
    pub user_id: String,
    pub assigned_category: String,
    pub confidence_score: f32,
    pub is_new_category: bool,
    pub processing_timestamp: DateTime<Utc>,
    pub category_description: Option<String>,
}

/// Kind of categorization job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Categorize without thread context.
    Standalone,
    /// Categorize with thread context.
    Threaded,
}

/// Lifecycle status of a categorization job.
///
/// Transitions are monotonic: Queued → Processing → {Completed | Failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A tracked asynchronous categorization job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub payload: JsonValue,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Queue statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

/// Which similarity-search strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Database-native nearest-neighbor query via pgvector.
    Pgvector,
    /// Full in-memory linear scan with cosine similarity.
    InMemory,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pgvector => write!(f, "pgvector"),
            Self::InMemory => write!(f, "in_memory"),
        }
    }
}

/// Coverage statistics for category embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingStats {
    pub total_categories: i64,
    pub categories_with_embeddings: i64,
    pub embedding_coverage: f64,
    pub strategy: MatchStrategy,
}

/// Aggregate pipeline throughput metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub batches_processed: u64,
    pub avg_batch_size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_status_serde() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"queued\""
        );
        let status: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, JobStatus::Failed);
    }

    #[test]
    fn test_match_strategy_display() {
        assert_eq!(MatchStrategy::Pgvector.to_string(), "pgvector");
        assert_eq!(MatchStrategy::InMemory.to_string(), "in_memory");
    }

    #[test]
    fn test_threaded_to_standalone_drops_context() {
        let threaded = ThreadedEmail {
            email_id: "e1".into(),
            user_id: "u1".into(),
            subject: "Re: Budget".into(),
            body: "numbers attached".into(),
            snippet: Some("numbers".into()),
            sender_email: None,
            timestamp: None,
            thread_id: "t1".into(),
            thread_subject: "Budget".into(),
            previous_category: Some("finance".into()),
            previous_email_snippet: None,
            thread_email_count: 3,
        };

        let standalone = threaded.to_standalone();
        assert_eq!(standalone.email_id, "e1");
        assert_eq!(standalone.subject, "Re: Budget");
        assert_eq!(standalone.snippet.as_deref(), Some("numbers"));
    }

    #[test]
    fn test_categorization_roundtrip() {
        let c = Categorization {
            email_id: "e1".into(),
            user_id: "u1".into(),
            assigned_category: "finance".into(),
            confidence_score: 0.8,
            is_new_category: true,
            processing_timestamp: Utc::now(),
            category_description: Some("Auto-generated: Invoice...".into()),
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Categorization = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assigned_category, "finance");
        assert!(back.is_new_category);
    }

    #[test]
    fn test_standalone_email_defaults() {
        let email: StandaloneEmail =
            serde_json::from_str(r#"{"email_id":"e1","user_id":"u1"}"#).unwrap();
        assert_eq!(email.subject, "");
        assert_eq!(email.body, "");
        assert!(email.snippet.is_none());
    }
}
