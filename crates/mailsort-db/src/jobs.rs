//! Job repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use mailsort_core::{Error, Job, JobKind, JobRepository, JobStatus, QueueStats, Result};

/// PostgreSQL implementation of JobRepository.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Convert JobKind to string for database.
    fn job_kind_to_str(kind: JobKind) -> &'static str {
        match kind {
            JobKind::Standalone => "standalone",
            JobKind::Threaded => "threaded",
        }
    }

    /// Convert string from database to JobKind.
    fn str_to_job_kind(s: &str) -> JobKind {
        match s {
            "threaded" => JobKind::Threaded,
            _ => JobKind::Standalone, // fallback
        }
    }

    /// Convert string from database to JobStatus.
    fn str_to_job_status(s: &str) -> JobStatus {
        match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Queued, // fallback
        }
    }

    /// Parse a job row into a Job struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> Job {
        Job {
            id: row.get("id"),
            kind: Self::str_to_job_kind(row.get("kind")),
            status: Self::str_to_job_status(row.get("status")),
            payload: row.get("payload"),
            result: row.get("result"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

const JOB_COLUMNS: &str =
    "id, kind, status, payload, result, error_message, created_at, started_at, completed_at";

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn queue(&self, kind: JobKind, payload: JsonValue) -> Result<Uuid> {
        let job_id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO job_queue (id, kind, status, payload, created_at)
             VALUES ($1, $2, 'queued', $3, $4)",
        )
        .bind(job_id)
        .bind(Self::job_kind_to_str(kind))
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(job_id)
    }

    async fn claim_next(&self) -> Result<Option<Job>> {
        let now = Utc::now();

        // FOR UPDATE SKIP LOCKED keeps concurrent claimers from double
        // delivery without serializing on a single row lock.
        let row = sqlx::query(&format!(
            "UPDATE job_queue
             SET status = 'processing', started_at = $1
             WHERE id = (
                 SELECT id FROM job_queue
                 WHERE status = 'queued'
                 ORDER BY created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn complete(&self, id: Uuid, result: JsonValue) -> Result<()> {
        let now = Utc::now();

        let updated = sqlx::query(
            "UPDATE job_queue
             SET status = 'completed', completed_at = $1, result = $2
             WHERE id = $3",
        )
        .bind(now)
        .bind(&result)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();

        // Failures are terminal: no retry counter, no requeue.
        let updated = sqlx::query(
            "UPDATE job_queue
             SET status = 'failed', completed_at = $1, error_message = $2
             WHERE id = $3",
        )
        .bind(now)
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM job_queue WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'queued') as queued,
                COUNT(*) FILTER (WHERE status = 'processing') as processing,
                COUNT(*) FILTER (WHERE status = 'completed') as completed,
                COUNT(*) FILTER (WHERE status = 'failed') as failed,
                COUNT(*) as total
             FROM job_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            queued: row.get::<i64, _>("queued"),
            processing: row.get::<i64, _>("processing"),
            completed: row.get::<i64, _>("completed"),
            failed: row.get::<i64, _>("failed"),
            total: row.get::<i64, _>("total"),
        })
    }

    async fn clear_terminal(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM job_queue WHERE status IN ('completed', 'failed')")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_round_trip() {
        for kind in [JobKind::Standalone, JobKind::Threaded] {
            let s = PgJobRepository::job_kind_to_str(kind);
            assert_eq!(PgJobRepository::str_to_job_kind(s), kind);
        }
    }

    #[test]
    fn test_str_to_job_kind_unknown_fallback() {
        assert_eq!(
            PgJobRepository::str_to_job_kind("unknown"),
            JobKind::Standalone
        );
        assert_eq!(PgJobRepository::str_to_job_kind(""), JobKind::Standalone);
    }

    #[test]
    fn test_str_to_job_status_known_values() {
        // The status literals written by the SQL statements above
        assert_eq!(
            PgJobRepository::str_to_job_status("queued"),
            JobStatus::Queued
        );
        assert_eq!(
            PgJobRepository::str_to_job_status("processing"),
            JobStatus::Processing
        );
        assert_eq!(
            PgJobRepository::str_to_job_status("completed"),
            JobStatus::Completed
        );
        assert_eq!(
            PgJobRepository::str_to_job_status("failed"),
            JobStatus::Failed
        );
    }

    #[test]
    fn test_str_to_job_status_unknown_fallback() {
        assert_eq!(
            PgJobRepository::str_to_job_status("cancelled"),
            JobStatus::Queued
        );
        assert_eq!(PgJobRepository::str_to_job_status(""), JobStatus::Queued);
    }
}
