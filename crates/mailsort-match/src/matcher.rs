//! Category similarity matcher.
//!
//! Prefers the database-native nearest-neighbor operator and falls back to
//! a bounded in-memory scan when the extension is missing or a native
//! query fails at runtime. The strategy is probed once at construction;
//! a per-call native failure falls back without flipping the strategy.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use mailsort_core::{
    Category, CategoryRepository, EmbeddingStats, MatchStrategy, Result,
};

use crate::similarity::cosine_similarity;

/// Matches query embeddings against stored category embeddings.
pub struct SimilarityMatcher {
    categories: Arc<dyn CategoryRepository>,
    strategy: MatchStrategy,
    max_scan: i64,
}

impl SimilarityMatcher {
    /// Create a matcher, probing the repository once for native search
    /// support.
    pub async fn probe(categories: Arc<dyn CategoryRepository>, max_scan: i64) -> Result<Self> {
        let native = categories.supports_native_search().await.unwrap_or(false);
        let strategy = if native {
            MatchStrategy::Pgvector
        } else {
            MatchStrategy::InMemory
        };

        info!(
            subsystem = "match",
            component = "matcher",
            op = "probe",
            strategy = %strategy,
            max_scan,
            "Similarity matcher initialized"
        );

        Ok(Self {
            categories,
            strategy,
            max_scan,
        })
    }

    /// The strategy chosen at construction.
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Find categories similar to `query`, descending by similarity.
    ///
    /// A zero-norm query returns no matches without touching the store.
    pub async fn find_similar(
        &self,
        query: &[f32],
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<(Category, f32)>> {
        if query.iter().all(|x| *x == 0.0) {
            debug!(
                subsystem = "match",
                component = "matcher",
                op = "find_similar",
                "Zero-norm query, skipping search"
            );
            return Ok(vec![]);
        }

        if self.strategy == MatchStrategy::Pgvector {
            match self
                .categories
                .find_similar_native(query, threshold, limit)
                .await
            {
                Ok(matches) => return Ok(matches),
                Err(e) => {
                    warn!(
                        subsystem = "match",
                        component = "matcher",
                        op = "find_similar",
                        error = %e,
                        "Native search failed, falling back to in-memory scan"
                    );
                }
            }
        }

        self.scan_in_memory(query, threshold, limit).await
    }

    /// Overwrite a category's stored embedding.
    pub async fn add_embedding(&self, id: Uuid, embedding: &[f32]) -> Result<()> {
        self.categories.update_embedding(id, embedding).await
    }

    /// Embedding coverage statistics.
    pub async fn stats(&self) -> Result<EmbeddingStats> {
        let total = self.categories.count().await?;
        let with_embeddings = self.categories.count_with_embeddings().await?;
        let coverage = if total > 0 {
            with_embeddings as f64 / total as f64
        } else {
            0.0
        };

        Ok(EmbeddingStats {
            total_categories: total,
            categories_with_embeddings: with_embeddings,
            embedding_coverage: coverage,
            strategy: self.strategy,
        })
    }

    async fn scan_in_memory(
        &self,
        query: &[f32],
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<(Category, f32)>> {
        let candidates = self.categories.list(0, self.max_scan).await?;

        let mut matches: Vec<(Category, f32)> = Vec::new();
        for category in candidates {
            let Some(embedding) = category.embedding.as_deref() else {
                warn!(
                    subsystem = "match",
                    component = "matcher",
                    op = "scan",
                    category_name = %category.name,
                    "Category has no embedding, skipping"
                );
                continue;
            };
            if embedding.len() != query.len() {
                warn!(
                    subsystem = "match",
                    component = "matcher",
                    op = "scan",
                    category_name = %category.name,
                    expected = query.len(),
                    actual = embedding.len(),
                    "Embedding dimension mismatch, skipping"
                );
                continue;
            }

            let score = cosine_similarity(query, embedding);
            if score >= threshold {
                matches.push((category, score));
            }
        }

        // Stable sort: equal scores keep insertion order
        matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        matches.truncate(limit.max(0) as usize);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailsort_db::test_fixtures::InMemoryCategoryRepository;

    fn category(name: &str, embedding: Option<Vec<f32>>) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            embedding,
            email_count: 0,
            sample_content: None,
            created_at: Utc::now(),
        }
    }

    async fn matcher_with(
        categories: Vec<Category>,
    ) -> (SimilarityMatcher, Arc<InMemoryCategoryRepository>) {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        for c in categories {
            repo.seed(c);
        }
        let matcher = SimilarityMatcher::probe(repo.clone(), 1000).await.unwrap();
        (matcher, repo)
    }

    #[tokio::test]
    async fn test_in_memory_strategy_without_native_support() {
        let (matcher, _) = matcher_with(vec![]).await;
        assert_eq!(matcher.strategy(), MatchStrategy::InMemory);
    }

    #[tokio::test]
    async fn test_find_similar_orders_descending() {
        let (matcher, _) = matcher_with(vec![
            category("far", Some(vec![0.5, 1.0])),
            category("near", Some(vec![1.0, 0.1])),
        ])
        .await;

        let matches = matcher.find_similar(&[1.0, 0.0], 0.1, 10).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].0.name, "near");
        assert!(matches[0].1 > matches[1].1);
    }

    #[tokio::test]
    async fn test_threshold_filters_weak_matches() {
        let (matcher, _) = matcher_with(vec![
            category("strong", Some(vec![1.0, 0.0])),
            category("weak", Some(vec![0.0, 1.0])),
        ])
        .await;

        let matches = matcher.find_similar(&[1.0, 0.0], 0.7, 10).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.name, "strong");
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let (matcher, _) = matcher_with(vec![
            category("a", Some(vec![1.0, 0.0])),
            category("b", Some(vec![0.9, 0.1])),
            category("c", Some(vec![0.8, 0.2])),
        ])
        .await;

        let matches = matcher.find_similar(&[1.0, 0.0], 0.1, 2).await.unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_query_skips_store() {
        let (matcher, repo) = matcher_with(vec![category("a", Some(vec![1.0, 0.0]))]).await;

        let matches = matcher.find_similar(&[0.0, 0.0], 0.0, 10).await.unwrap();
        assert!(matches.is_empty());
        assert_eq!(repo.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_scan_skips_missing_and_mismatched_embeddings() {
        let (matcher, _) = matcher_with(vec![
            category("no-embedding", None),
            category("wrong-dim", Some(vec![1.0, 0.0, 0.0])),
            category("good", Some(vec![1.0, 0.0])),
        ])
        .await;

        let matches = matcher.find_similar(&[1.0, 0.0], 0.5, 10).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.name, "good");
    }

    #[tokio::test]
    async fn test_stats_coverage() {
        let (matcher, _) = matcher_with(vec![
            category("a", Some(vec![1.0, 0.0])),
            category("b", None),
        ])
        .await;

        let stats = matcher.stats().await.unwrap();
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.categories_with_embeddings, 1);
        assert!((stats.embedding_coverage - 0.5).abs() < 1e-9);
        assert_eq!(stats.strategy, MatchStrategy::InMemory);
    }

    #[tokio::test]
    async fn test_stats_empty_store() {
        let (matcher, _) = matcher_with(vec![]).await;
        let stats = matcher.stats().await.unwrap();
        assert_eq!(stats.embedding_coverage, 0.0);
    }
}
