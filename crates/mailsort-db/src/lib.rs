//! # mailsort-db
//!
//! PostgreSQL database layer for mailsort.
//!
//! This crate provides:
//! - Connection pool management
//! - Category persistence with pgvector similarity search
//! - The durable categorization job queue
//! - The durable tier of the result cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use mailsort_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/mailsort").await?;
//!     let total = db.categories.count().await?;
//!     println!("{total} categories");
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod jobs;
pub mod pool;
pub mod results;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use the doubles
pub mod test_fixtures;

// Re-export core types
pub use mailsort_core::*;

pub use categories::PgCategoryRepository;
pub use jobs::PgJobRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use results::PgResultCacheRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Category repository with vector search.
    pub categories: PgCategoryRepository,
    /// Job repository for the categorization queue.
    pub jobs: PgJobRepository,
    /// Durable result-cache repository.
    pub results: PgResultCacheRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            categories: PgCategoryRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            results: PgResultCacheRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
