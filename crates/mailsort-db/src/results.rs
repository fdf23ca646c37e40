//! Durable result-cache repository.
//!
//! Second tier of the categorization result cache. Entries carry an
//! absolute expiry; reads never return an expired row, and a periodic
//! purge keeps the table from growing unbounded.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres};
use tracing::debug;

use mailsort_core::{Error, Result, ResultCacheStore};

/// PostgreSQL implementation of the durable result-cache tier.
pub struct PgResultCacheRepository {
    pool: Pool<Postgres>,
}

impl PgResultCacheRepository {
    /// Create a new PgResultCacheRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultCacheStore for PgResultCacheRepository {
    async fn put(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| Error::Cache(format!("TTL out of range: {e}")))?;

        sqlx::query(
            "INSERT INTO result_cache (key, value, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(&value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let value: Option<JsonValue> = sqlx::query_scalar(
            "SELECT value FROM result_cache WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(value)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM result_cache WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(
                subsystem = "database",
                component = "result_cache",
                op = "purge_expired",
                result_count = removed,
                "Purged expired result-cache entries"
            );
        }
        Ok(removed)
    }
}
