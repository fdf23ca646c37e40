//! The async categorization pipeline.
//!
//! Front door for asynchronous and bulk categorization: submits durable
//! jobs for the worker, serves results from the two-tier cache, and runs
//! bulk batches synchronously with cache partitioning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info};
use uuid::Uuid;

use mailsort_core::{
    content_fingerprint, Categorization, Job, JobKind, JobRepository, PipelineMetrics, QueueStats,
    Result, StandaloneEmail, ThreadedEmail,
};
use mailsort_engine::CategorizationEngine;

use crate::two_tier::TwoTierResultCache;

/// Outcome of a bulk submission.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    /// One result per input email, in input order.
    pub results: Vec<Categorization>,
    /// How many came from the cache.
    pub cache_hits: usize,
    /// How many were processed through the engine.
    pub processed: usize,
}

/// The categorization task pipeline.
pub struct TaskPipeline {
    jobs: Arc<dyn JobRepository>,
    cache: Arc<TwoTierResultCache>,
    engine: Arc<CategorizationEngine>,
    batches: AtomicU64,
    batch_emails: AtomicU64,
}

impl TaskPipeline {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        cache: Arc<TwoTierResultCache>,
        engine: Arc<CategorizationEngine>,
    ) -> Self {
        Self {
            jobs,
            cache,
            engine,
            batches: AtomicU64::new(0),
            batch_emails: AtomicU64::new(0),
        }
    }

    /// The result cache, shared with the worker.
    pub fn cache(&self) -> &Arc<TwoTierResultCache> {
        &self.cache
    }

    /// Queue a raw payload of the given kind.
    pub async fn submit(&self, kind: JobKind, payload: JsonValue) -> Result<Uuid> {
        let id = self.jobs.queue(kind, payload).await?;
        debug!(
            subsystem = "jobs",
            component = "pipeline",
            op = "submit",
            job_id = %id,
            "Job queued"
        );
        Ok(id)
    }

    /// Queue a standalone email for background categorization.
    pub async fn submit_standalone(&self, email: &StandaloneEmail) -> Result<Uuid> {
        self.submit(JobKind::Standalone, serde_json::to_value(email)?)
            .await
    }

    /// Queue a threaded email for background categorization.
    pub async fn submit_threaded(&self, email: &ThreadedEmail) -> Result<Uuid> {
        self.submit(JobKind::Threaded, serde_json::to_value(email)?)
            .await
    }

    /// Look up a job. Unknown ids are `None`, never a default status.
    pub async fn job_status(&self, id: Uuid) -> Result<Option<Job>> {
        self.jobs.get(id).await
    }

    /// Cache a result under an arbitrary key.
    pub async fn cache_result(&self, key: &str, result: &Categorization) -> Result<()> {
        self.cache.put(key, result).await
    }

    /// Look up a cached result by key.
    pub async fn get_cached_result(&self, key: &str) -> Result<Option<Categorization>> {
        self.cache.get(key).await
    }

    /// The two cache keys for an email: its id and its content fingerprint.
    pub fn result_keys(email: &StandaloneEmail) -> (String, String) {
        (
            email.email_id.clone(),
            content_fingerprint(&email.subject, &email.body),
        )
    }

    /// Check the cache under both the email-id and fingerprint keys.
    pub async fn lookup(&self, email: &StandaloneEmail) -> Result<Option<Categorization>> {
        let (id_key, fp_key) = Self::result_keys(email);
        if let Some(result) = self.cache.get(&id_key).await? {
            return Ok(Some(result));
        }
        self.cache.get(&fp_key).await
    }

    /// Process a batch synchronously. Cache hits are returned as-is;
    /// misses run through the engine and are cached under both keys.
    pub async fn submit_bulk(&self, emails: &[StandaloneEmail]) -> Result<BulkOutcome> {
        let mut results = Vec::with_capacity(emails.len());
        let mut cache_hits = 0;
        let mut processed = 0;

        for email in emails {
            if let Some(cached) = self.lookup(email).await? {
                debug!(
                    subsystem = "jobs",
                    component = "pipeline",
                    op = "bulk",
                    email_id = %email.email_id,
                    "Bulk cache hit"
                );
                cache_hits += 1;
                results.push(cached);
                continue;
            }

            let result = self.engine.categorize_standalone(email).await;
            let (id_key, fp_key) = Self::result_keys(email);
            self.cache.put(&id_key, &result).await?;
            self.cache.put(&fp_key, &result).await?;
            processed += 1;
            results.push(result);
        }

        self.record_batch(emails.len() as u64);
        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "bulk",
            result_count = emails.len(),
            cache_hits,
            processed,
            "Bulk batch processed"
        );

        Ok(BulkOutcome {
            results,
            cache_hits,
            processed,
        })
    }

    /// Record a processed batch of `n` emails in the throughput metrics.
    pub fn record_batch(&self, n: u64) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.batch_emails.fetch_add(n, Ordering::Relaxed);
    }

    /// Aggregate cache and batch metrics.
    pub fn metrics(&self) -> PipelineMetrics {
        let batches = self.batches.load(Ordering::Relaxed);
        let emails = self.batch_emails.load(Ordering::Relaxed);
        PipelineMetrics {
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            batches_processed: batches,
            avg_batch_size: if batches > 0 {
                emails as f64 / batches as f64
            } else {
                0.0
            },
        }
    }

    /// Queue statistics.
    pub async fn queue_stats(&self) -> Result<QueueStats> {
        self.jobs.stats().await
    }

    /// Delete terminal job records. The result caches are untouched.
    pub async fn clear_completed(&self) -> Result<u64> {
        self.jobs.clear_terminal().await
    }
}
