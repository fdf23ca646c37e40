//! Connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use mailsort_core::{Error, Result};

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections.
    pub max_connections: u32,
    /// Connections kept open when idle.
    pub min_connections: u32,
    /// Seconds to wait for a connection before giving up.
    pub acquire_timeout_secs: u64,
    /// Seconds an idle connection is kept before being closed.
    pub idle_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PoolConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MAILSORT_DB_MAX_CONNECTIONS` | `10` |
    /// | `MAILSORT_DB_MIN_CONNECTIONS` | `1` |
    /// | `MAILSORT_DB_ACQUIRE_TIMEOUT_SECS` | `30` |
    /// | `MAILSORT_DB_IDLE_TIMEOUT_SECS` | `600` |
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_connections: env_parse("MAILSORT_DB_MAX_CONNECTIONS", d.max_connections),
            min_connections: env_parse("MAILSORT_DB_MIN_CONNECTIONS", d.min_connections),
            acquire_timeout_secs: env_parse(
                "MAILSORT_DB_ACQUIRE_TIMEOUT_SECS",
                d.acquire_timeout_secs,
            ),
            idle_timeout_secs: env_parse("MAILSORT_DB_IDLE_TIMEOUT_SECS", d.idle_timeout_secs),
        }
    }

    /// Set the maximum number of connections.
    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Set the minimum number of connections.
    pub fn with_min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    /// Set the acquire timeout in seconds.
    pub fn with_acquire_timeout_secs(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }
}

/// Connect a pool with settings from the environment.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::from_env()).await
}

/// Connect a pool with explicit settings.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_builder_chaining() {
        let config = PoolConfig::default()
            .with_max_connections(20)
            .with_min_connections(5)
            .with_acquire_timeout_secs(60);

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout_secs, 60);
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        // The MAILSORT_DB_* variables are unset in the test environment
        let config = PoolConfig::from_env();
        assert_eq!(config.max_connections, PoolConfig::default().max_connections);
        assert_eq!(config.idle_timeout_secs, PoolConfig::default().idle_timeout_secs);
    }
}
