//! Background worker that drains the categorization job queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use mailsort_core::{
    content_fingerprint, defaults, Error, Job, JobKind, JobRepository, Result, StandaloneEmail,
    ThreadedEmail,
};
use mailsort_engine::CategorizationEngine;

use crate::two_tier::TwoTierResultCache;

/// Configuration for the categorization worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Seconds to wait before retrying after a claim error.
    pub backoff_secs: u64,
    /// Whether to enable job processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::WORKER_POLL_INTERVAL_MS,
            backoff_secs: defaults::WORKER_BACKOFF_SECS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MAILSORT_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `MAILSORT_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    /// | `MAILSORT_BACKOFF_SECS` | `5` | Backoff after a claim error |
    pub fn from_env() -> Self {
        let enabled = std::env::var("MAILSORT_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_ms = std::env::var("MAILSORT_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::WORKER_POLL_INTERVAL_MS);

        let backoff_secs = std::env::var("MAILSORT_BACKOFF_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::WORKER_BACKOFF_SECS);

        Self {
            poll_interval_ms,
            backoff_secs,
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the backoff after a claim error.
    pub fn with_backoff_secs(mut self, secs: u64) -> Self {
        self.backoff_secs = secs;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the categorization worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was claimed and started.
    JobStarted { job_id: Uuid, kind: JobKind },
    /// A job completed successfully.
    JobCompleted { job_id: Uuid, kind: JobKind },
    /// A job failed terminally.
    JobFailed {
        job_id: Uuid,
        kind: JobKind,
        error: String,
    },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that claims queued jobs one at a time and runs them through
/// the engine. A failed job is marked terminally failed; the loop keeps
/// going regardless of individual job outcomes.
pub struct CategorizationWorker {
    jobs: Arc<dyn JobRepository>,
    engine: Arc<CategorizationEngine>,
    cache: Arc<TwoTierResultCache>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl CategorizationWorker {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        engine: Arc<CategorizationEngine>,
        cache: Arc<TwoTierResultCache>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            jobs,
            engine,
            cache,
            config,
            event_tx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Categorization worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            backoff_secs = self.config.backoff_secs,
            "Categorization worker started"
        );

        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let backoff = Duration::from_secs(self.config.backoff_secs);

        loop {
            // Check for shutdown before claiming a job
            if shutdown_rx.try_recv().is_ok() {
                info!("Categorization worker received shutdown signal");
                break;
            }

            match self.jobs.claim_next().await {
                Ok(Some(job)) => {
                    self.process_job(job).await;
                    // Immediately try to claim the next job
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Categorization worker received shutdown signal");
                            break;
                        }
                        _ = sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!(error = ?e, "Failed to claim job, backing off");
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Categorization worker received shutdown signal");
                            break;
                        }
                        _ = sleep(backoff) => {}
                    }
                }
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Categorization worker stopped");
    }

    /// Execute a single claimed job to a terminal state.
    async fn process_job(&self, job: Job) {
        let start = Instant::now();
        let job_id = job.id;
        let kind = job.kind;

        info!(%job_id, ?kind, "Processing job");
        let _ = self.event_tx.send(WorkerEvent::JobStarted { job_id, kind });

        match self.execute(&job).await {
            Ok(()) => {
                debug!(
                    %job_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job completed"
                );
                let _ = self
                    .event_tx
                    .send(WorkerEvent::JobCompleted { job_id, kind });
            }
            Err(e) => {
                let message = e.to_string();
                warn!(%job_id, error = %message, "Job failed");
                if let Err(fail_err) = self.jobs.fail(job_id, &message).await {
                    error!(%job_id, error = ?fail_err, "Failed to mark job failed");
                }
                let _ = self.event_tx.send(WorkerEvent::JobFailed {
                    job_id,
                    kind,
                    error: message,
                });
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<()> {
        let (result, subject, body) = match job.kind {
            JobKind::Standalone => {
                let email: StandaloneEmail = serde_json::from_value(job.payload.clone())?;
                let result = self.engine.categorize_standalone(&email).await;
                (result, email.subject, email.body)
            }
            JobKind::Threaded => {
                let email: ThreadedEmail = serde_json::from_value(job.payload.clone())?;
                let result = self.engine.categorize_threaded(&email).await;
                (result, email.subject, email.body)
            }
        };

        self.jobs
            .complete(job.id, serde_json::to_value(&result)?)
            .await?;

        // Cache under both keys so bulk lookups hit later
        self.cache.put(&result.email_id, &result).await?;
        self.cache
            .put(&content_fingerprint(&subject, &body), &result)
            .await?;

        Ok(())
    }
}
