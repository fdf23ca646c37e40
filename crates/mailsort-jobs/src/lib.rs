//! # mailsort-jobs
//!
//! Asynchronous categorization: durable job queue, two-tier result
//! cache, and the background worker.
//!
//! This crate provides:
//! - Job submission and status tracking through the queue
//! - A memory-over-durable result cache with hit/miss accounting
//! - Synchronous bulk processing with cache partitioning
//! - A single-consumer worker with graceful shutdown and events
//!
//! ## Example
//!
//! ```ignore
//! use mailsort_jobs::{CategorizationWorker, TaskPipeline, TwoTierResultCache, WorkerConfig};
//!
//! let results = Arc::new(PgResultCacheRepository::new(db.pool.clone()));
//! let cache = Arc::new(TwoTierResultCache::new(results));
//! let pipeline = TaskPipeline::new(jobs.clone(), cache.clone(), engine.clone());
//!
//! let worker = CategorizationWorker::new(jobs, engine, cache, WorkerConfig::from_env());
//! let handle = worker.start();
//!
//! let job_id = pipeline.submit_standalone(&email).await?;
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod pipeline;
pub mod two_tier;
pub mod worker;

// Re-export core types
pub use mailsort_core::*;

pub use pipeline::{BulkOutcome, TaskPipeline};
pub use two_tier::TwoTierResultCache;
pub use worker::{CategorizationWorker, WorkerConfig, WorkerEvent, WorkerHandle};
