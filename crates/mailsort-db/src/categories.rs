//! Category repository implementation.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use mailsort_core::{Category, CategoryRepository, Error, Result};

/// PostgreSQL implementation of CategoryRepository, backed by pgvector.
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    /// Create a new PgCategoryRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a category row into a Category struct.
    fn parse_category_row(row: &sqlx::postgres::PgRow) -> Category {
        let embedding: Option<Vector> = row.get("embedding");
        Category {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            embedding: embedding.map(|v| v.to_vec()),
            email_count: row.get("email_count"),
            sample_content: row.get("sample_content"),
            created_at: row.get("created_at"),
        }
    }
}

const CATEGORY_COLUMNS: &str =
    "id, name, description, embedding, email_count, sample_content, created_at";

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        embedding: Option<&[f32]>,
        sample_content: Option<&str>,
    ) -> Result<Category> {
        let id = Uuid::new_v4();
        let vector = embedding.map(|e| Vector::from(e.to_vec()));

        let inserted = sqlx::query(&format!(
            "INSERT INTO category (id, name, description, embedding, email_count, sample_content)
             VALUES ($1, $2, $3, $4, 0, $5)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(&vector)
        .bind(sample_content)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                info!(
                    subsystem = "database",
                    component = "categories",
                    op = "create",
                    category_id = %id,
                    category_name = name,
                    "Category created"
                );
                Ok(Self::parse_category_row(&row))
            }
            // Concurrent creation under the same name: the unique index on
            // LOWER(name) rejects the insert, so resolve to the winner's row.
            Err(e) => {
                let unique_violation = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);
                if unique_violation {
                    debug!(
                        subsystem = "database",
                        component = "categories",
                        op = "create",
                        category_name = name,
                        "Name already taken, returning existing category"
                    );
                    self.get_by_name(name)
                        .await?
                        .ok_or_else(|| Error::NotFound(format!("category '{name}'")))
                } else {
                    Err(Error::Database(e))
                }
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::parse_category_row(&r)))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE LOWER(name) = LOWER($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::parse_category_row(&r)))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             ORDER BY created_at ASC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_category_row).collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }

    async fn count_with_embeddings(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE embedding IS NOT NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn increment_count(&self, id: Uuid, delta: i64) -> Result<()> {
        let result = sqlx::query("UPDATE category SET email_count = email_count + $1 WHERE id = $2")
            .bind(delta)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CategoryNotFound(id));
        }
        Ok(())
    }

    async fn update_embedding(&self, id: Uuid, embedding: &[f32]) -> Result<()> {
        let vector = Vector::from(embedding.to_vec());
        let result = sqlx::query("UPDATE category SET embedding = $1 WHERE id = $2")
            .bind(&vector)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CategoryNotFound(id));
        }

        debug!(
            subsystem = "database",
            component = "categories",
            op = "update_embedding",
            category_id = %id,
            dimension = embedding.len(),
            "Category embedding updated"
        );
        Ok(())
    }

    async fn supports_native_search(&self) -> Result<bool> {
        let installed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pg_extension WHERE extname = 'vector')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(installed)
    }

    async fn find_similar_native(
        &self,
        query: &[f32],
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<(Category, f32)>> {
        let vector = Vector::from(query.to_vec());

        // Cosine distance operator; similarity = 1 - distance. Rows without
        // an embedding are excluded before the operator runs.
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS}, 1 - (embedding <=> $1) AS score
             FROM category
             WHERE embedding IS NOT NULL
               AND 1 - (embedding <=> $1) >= $2
             ORDER BY embedding <=> $1 ASC
             LIMIT $3"
        ))
        .bind(&vector)
        .bind(threshold as f64)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| {
                let score: f64 = row.get("score");
                (Self::parse_category_row(row), score as f32)
            })
            .collect())
    }
}
