//! Integration tests for the pipeline and worker working together.
//!
//! These run entirely against the in-memory repositories, so they
//! exercise the claim/complete/fail lifecycle without a database.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use uuid::Uuid;

use mailsort_core::{Categorization, JobRepository, JobStatus, ServiceConfig};
use mailsort_db::test_fixtures::{
    standalone_email, threaded_email, InMemoryCategoryRepository, InMemoryJobRepository,
    InMemoryResultCacheStore,
};
use mailsort_engine::{CanonicalLabels, CategorizationEngine};
use mailsort_inference::{Embedder, MockEmbeddingBackend};
use mailsort_jobs::{
    CategorizationWorker, TaskPipeline, TwoTierResultCache, WorkerConfig, WorkerEvent,
};
use mailsort_match::SimilarityMatcher;

struct Harness {
    jobs: Arc<InMemoryJobRepository>,
    pipeline: TaskPipeline,
    worker: CategorizationWorker,
}

async fn harness() -> Harness {
    let repo = Arc::new(InMemoryCategoryRepository::new());
    let embedder = Embedder::new(Arc::new(MockEmbeddingBackend::new()));
    let matcher = SimilarityMatcher::probe(repo.clone(), 1000)
        .await
        .expect("probe");
    let canonical = CanonicalLabels::seed(&embedder).await;
    let engine = Arc::new(CategorizationEngine::new(
        embedder,
        matcher,
        repo,
        canonical,
        ServiceConfig::default(),
    ));

    let jobs = Arc::new(InMemoryJobRepository::new());
    let cache = Arc::new(TwoTierResultCache::new(Arc::new(
        InMemoryResultCacheStore::new(),
    )));

    let pipeline = TaskPipeline::new(jobs.clone(), cache.clone(), engine.clone());
    let worker = CategorizationWorker::new(
        jobs.clone(),
        engine,
        cache,
        WorkerConfig::default().with_poll_interval(10),
    );

    Harness {
        jobs,
        pipeline,
        worker,
    }
}

/// Poll until a job reaches the expected status or the timeout elapses.
async fn wait_for_status(
    jobs: &InMemoryJobRepository,
    job_id: Uuid,
    expected: JobStatus,
    timeout: Duration,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if let Ok(Some(job)) = jobs.get(job_id).await {
            if job.status == expected {
                return true;
            }
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_worker_completes_standalone_job() {
    let h = harness().await;
    let email = standalone_email("e1", "Invoice #42", "payment due next week");

    let job_id = h.pipeline.submit_standalone(&email).await.expect("submit");
    let handle = h.worker.start();

    assert!(
        wait_for_status(&h.jobs, job_id, JobStatus::Completed, Duration::from_secs(5)).await,
        "job did not complete"
    );

    let job = h.jobs.get(job_id).await.expect("get").expect("job");
    assert!(job.completed_at.is_some());
    let result: Categorization =
        serde_json::from_value(job.result.expect("result")).expect("deserialize");
    assert_eq!(result.email_id, "e1");
    assert_eq!(result.assigned_category, "finance");

    // The worker cached the result under the email-id key
    let cached = h
        .pipeline
        .get_cached_result("e1")
        .await
        .expect("cache")
        .expect("hit");
    assert_eq!(cached.assigned_category, "finance");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_completes_threaded_job() {
    let h = harness().await;
    let email = threaded_email(
        "e2",
        "Re: Trip planning",
        "booked the flight",
        "Trip planning",
        None,
    );

    let job_id = h.pipeline.submit_threaded(&email).await.expect("submit");
    let handle = h.worker.start();

    assert!(
        wait_for_status(&h.jobs, job_id, JobStatus::Completed, Duration::from_secs(5)).await,
        "job did not complete"
    );

    let job = h.jobs.get(job_id).await.expect("get").expect("job");
    let result: Categorization =
        serde_json::from_value(job.result.expect("result")).expect("deserialize");
    assert_eq!(result.email_id, "e2");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_bad_payload_fails_terminally_without_halting() {
    let h = harness().await;

    // Payload missing the required email fields
    let bad_id = h
        .pipeline
        .submit(mailsort_core::JobKind::Standalone, json!({"bogus": true}))
        .await
        .expect("submit");
    let good_id = h
        .pipeline
        .submit_standalone(&standalone_email("e3", "Team meeting", "agenda"))
        .await
        .expect("submit");

    let handle = h.worker.start();

    assert!(
        wait_for_status(&h.jobs, bad_id, JobStatus::Failed, Duration::from_secs(5)).await,
        "bad job did not fail"
    );
    assert!(
        wait_for_status(&h.jobs, good_id, JobStatus::Completed, Duration::from_secs(5)).await,
        "good job did not complete after the bad one"
    );

    let bad = h.jobs.get(bad_id).await.expect("get").expect("job");
    assert!(bad.error_message.is_some());
    assert!(bad.result.is_none());

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_graceful_shutdown_emits_stopped_event() {
    let h = harness().await;
    let handle = h.worker.start();
    let mut events = handle.events();

    // Subscribed before the shutdown signal, so WorkerStopped must arrive
    handle.shutdown().await.expect("shutdown");

    let mut stopped = false;
    while let Ok(event) = events.recv().await {
        if matches!(event, WorkerEvent::WorkerStopped) {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "worker never emitted WorkerStopped");
}

#[tokio::test]
async fn test_job_events_for_completed_job() {
    let h = harness().await;
    let mut events = h.worker.events();

    let job_id = h
        .pipeline
        .submit_standalone(&standalone_email("e4", "Doctor appointment", "clinic visit"))
        .await
        .expect("submit");
    let handle = h.worker.start();

    let mut started = false;
    let mut completed = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(WorkerEvent::JobStarted { job_id: id, .. })) if id == job_id => started = true,
            Ok(Ok(WorkerEvent::JobCompleted { job_id: id, .. })) if id == job_id => {
                completed = true;
                break;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }

    assert!(started, "missing JobStarted event");
    assert!(completed, "missing JobCompleted event");

    handle.shutdown().await.expect("shutdown");
}
