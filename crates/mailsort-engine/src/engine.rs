//! The categorization engine.
//!
//! Decision order for a standalone email: match an existing category,
//! otherwise mint one under a canonical label, and degrade to the general
//! category when anything in the pipeline errors. Threaded emails try the
//! thread-consistency fast path first and fall through to the standalone
//! path when it does not hold.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use mailsort_core::{
    defaults, text, thread, Categorization, CategoryRepository, Result, ServiceConfig,
    StandaloneEmail, ThreadedEmail,
};
use mailsort_inference::Embedder;
use mailsort_match::{cosine_similarity, SimilarityMatcher};

use crate::canonical::CanonicalLabels;

const GENERAL_DESCRIPTION: &str = "General email category";

/// Categorizes emails against the persistent category store.
pub struct CategorizationEngine {
    embedder: Embedder,
    matcher: SimilarityMatcher,
    categories: Arc<dyn CategoryRepository>,
    canonical: CanonicalLabels,
    config: ServiceConfig,
}

impl CategorizationEngine {
    pub fn new(
        embedder: Embedder,
        matcher: SimilarityMatcher,
        categories: Arc<dyn CategoryRepository>,
        canonical: CanonicalLabels,
        config: ServiceConfig,
    ) -> Self {
        Self {
            embedder,
            matcher,
            categories,
            canonical,
            config,
        }
    }

    /// The canonical-label table, for administration.
    pub fn canonical(&self) -> &CanonicalLabels {
        &self.canonical
    }

    /// The embedder, shared with the canonical table for recomputation.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The similarity matcher.
    pub fn matcher(&self) -> &SimilarityMatcher {
        &self.matcher
    }

    /// Categorize a standalone email. Never fails: internal errors degrade
    /// to the general category at reduced confidence.
    pub async fn categorize_standalone(&self, email: &StandaloneEmail) -> Categorization {
        match self.try_categorize_standalone(email).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    subsystem = "engine",
                    component = "categorize",
                    op = "standalone",
                    email_id = %email.email_id,
                    error = %e,
                    "Categorization failed, using fallback"
                );
                self.fallback(email).await
            }
        }
    }

    /// Categorize a threaded email, trying the thread-consistency fast
    /// path before the full standalone flow.
    pub async fn categorize_threaded(&self, email: &ThreadedEmail) -> Categorization {
        match self.try_thread_fast_path(email).await {
            Ok(Some(result)) => return result,
            Ok(None) => {}
            Err(e) => {
                // The fast path is best-effort; its errors never block the
                // standalone flow.
                warn!(
                    subsystem = "engine",
                    component = "categorize",
                    op = "threaded",
                    email_id = %email.email_id,
                    error = %e,
                    "Thread fast path errored, falling through"
                );
            }
        }

        self.categorize_standalone(&email.to_standalone()).await
    }

    async fn try_categorize_standalone(&self, email: &StandaloneEmail) -> Result<Categorization> {
        let meaningful = text::meaningful_text(
            &email.subject,
            &email.body,
            self.config.max_subject_chars,
            self.config.max_body_chars,
        );
        let embedding = self.embedder.embed(&meaningful).await;

        let matches = self
            .matcher
            .find_similar(&embedding, self.config.category_match_threshold, 1)
            .await?;

        if let Some((category, score)) = matches.into_iter().next() {
            self.categories.increment_count(category.id, 1).await?;
            info!(
                subsystem = "engine",
                component = "categorize",
                op = "assign",
                email_id = %email.email_id,
                category_name = %category.name,
                score,
                "Assigned existing category"
            );
            return Ok(self.response(
                email,
                &category.name,
                score,
                false,
                category.description.clone(),
            ));
        }

        self.create_new_category(email, &meaningful, &embedding)
            .await
    }

    async fn create_new_category(
        &self,
        email: &StandaloneEmail,
        meaningful: &str,
        embedding: &[f32],
    ) -> Result<Categorization> {
        let name = self
            .canonical
            .resolve(
                meaningful,
                &self.embedder,
                self.config.canonical_embed_threshold,
            )
            .await;
        let name = name.trim().to_lowercase();

        let description = format!(
            "Auto-generated: {}...",
            text::truncate_chars(&email.subject, 50)
        );

        // create resolves name collisions to the existing row, so a
        // concurrent winner is reused rather than duplicated
        let category = self
            .categories
            .create(
                &name,
                Some(&description),
                Some(embedding),
                email.snippet.as_deref(),
            )
            .await?;
        self.categories.increment_count(category.id, 1).await?;

        info!(
            subsystem = "engine",
            component = "categorize",
            op = "create_new",
            email_id = %email.email_id,
            category_name = %category.name,
            "Created new category"
        );

        Ok(self.response(
            email,
            &category.name,
            defaults::NEW_CATEGORY_CONFIDENCE,
            true,
            category.description.clone(),
        ))
    }

    /// The thread-consistency check. `Ok(None)` means the fast path does
    /// not apply and the caller should run the standalone flow.
    async fn try_thread_fast_path(
        &self,
        email: &ThreadedEmail,
    ) -> Result<Option<Categorization>> {
        let Some(previous_name) = email.previous_category.as_deref() else {
            return Ok(None);
        };
        let Some(previous) = self.categories.get_by_name(previous_name).await? else {
            return Ok(None);
        };
        let Some(previous_embedding) = previous.embedding.as_deref() else {
            return Ok(None);
        };
        if !thread::is_continuation(&email.subject, &email.thread_subject) {
            return Ok(None);
        }

        let meaningful = text::meaningful_text(
            &email.subject,
            &email.body,
            self.config.max_subject_chars,
            self.config.max_body_chars,
        );
        let current = self.embedder.embed(&meaningful).await;
        let similarity = cosine_similarity(&current, previous_embedding);

        if similarity < self.config.thread_consistency_threshold {
            debug!(
                subsystem = "engine",
                component = "categorize",
                op = "thread_check",
                email_id = %email.email_id,
                score = similarity,
                "Thread content diverged from previous category"
            );
            return Ok(None);
        }

        self.categories.increment_count(previous.id, 1).await?;

        let confidence = (similarity + self.config.thread_confidence_boost)
            .min(defaults::THREAD_CONFIDENCE_CAP);

        info!(
            subsystem = "engine",
            component = "categorize",
            op = "thread_assign",
            email_id = %email.email_id,
            category_name = %previous.name,
            score = similarity,
            "Thread continuation kept previous category"
        );

        Ok(Some(Categorization {
            email_id: email.email_id.clone(),
            user_id: email.user_id.clone(),
            assigned_category: previous.name,
            confidence_score: confidence,
            is_new_category: false,
            processing_timestamp: Utc::now(),
            category_description: previous.description,
        }))
    }

    /// Last-resort assignment to the general category. Persistence errors
    /// here are logged and swallowed; the caller always gets a response.
    async fn fallback(&self, email: &StandaloneEmail) -> Categorization {
        let category = match self
            .categories
            .get_by_name(defaults::GENERAL_CATEGORY)
            .await
        {
            Ok(Some(existing)) => Some(existing),
            Ok(None) => self
                .categories
                .create(
                    defaults::GENERAL_CATEGORY,
                    Some(GENERAL_DESCRIPTION),
                    None,
                    None,
                )
                .await
                .ok(),
            Err(_) => None,
        };

        if let Some(category) = &category {
            if let Err(e) = self.categories.increment_count(category.id, 1).await {
                warn!(
                    subsystem = "engine",
                    component = "categorize",
                    op = "fallback",
                    error = %e,
                    "Could not update general category count"
                );
            }
        }

        self.response(
            email,
            defaults::GENERAL_CATEGORY,
            defaults::FALLBACK_CONFIDENCE,
            false,
            Some(GENERAL_DESCRIPTION.to_string()),
        )
    }

    fn response(
        &self,
        email: &StandaloneEmail,
        category: &str,
        confidence: f32,
        is_new: bool,
        description: Option<String>,
    ) -> Categorization {
        Categorization {
            email_id: email.email_id.clone(),
            user_id: email.user_id.clone(),
            assigned_category: category.to_string(),
            confidence_score: confidence,
            is_new_category: is_new,
            processing_timestamp: Utc::now(),
            category_description: description,
        }
    }
}
