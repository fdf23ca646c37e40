//! Canonical category labels.
//!
//! New categories are never named from raw email text. A small
//! administrable table of canonical labels decides the name: a keyword hit
//! wins in table order, an embedding similarity above the secondary
//! threshold wins next, and everything else lands in the general category.
//! Every mutation recomputes the label's embedding before the write
//! becomes visible to readers.

use tokio::sync::RwLock;
use tracing::{debug, info};

use mailsort_core::{defaults, Error, Result};
use mailsort_inference::Embedder;
use mailsort_match::cosine_similarity;

/// One canonical label: its name, matching keywords, and the embedding of
/// the name plus keywords.
#[derive(Debug, Clone)]
pub struct CanonicalLabel {
    pub name: String,
    pub keywords: Vec<String>,
    pub embedding: Vec<f32>,
}

/// The ordered canonical-label table.
pub struct CanonicalLabels {
    labels: RwLock<Vec<CanonicalLabel>>,
}

/// Keyword lists for the default table.
const SEED_LABELS: &[(&str, &[&str])] = &[
    ("work", &["meeting", "project", "work", "business", "team", "client"]),
    ("finance", &["payment", "invoice", "bill", "bank", "money", "expense"]),
    ("travel", &["flight", "hotel", "trip", "travel", "booking"]),
    ("personal", &["family", "friend", "personal", "vacation", "party"]),
    ("shopping", &["order", "purchase", "shipping", "delivery", "cart"]),
    ("health", &["doctor", "appointment", "health", "medical", "clinic"]),
];

fn label_text(name: &str, keywords: &[String]) -> String {
    format!("{} {}", name, keywords.join(" "))
}

impl CanonicalLabels {
    /// Create an empty table.
    pub fn empty() -> Self {
        Self {
            labels: RwLock::new(Vec::new()),
        }
    }

    /// Create the default table, embedding each label through `embedder`.
    pub async fn seed(embedder: &Embedder) -> Self {
        let table = Self::empty();
        for (name, keywords) in SEED_LABELS {
            let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
            // Seeding cannot collide with itself, ignore the duplicate check
            let _ = table.add(name, keywords, embedder).await;
        }
        info!(
            subsystem = "engine",
            component = "canonical",
            op = "seed",
            result_count = SEED_LABELS.len(),
            "Canonical label table seeded"
        );
        table
    }

    /// List labels as (name, keywords) pairs, in table order.
    pub async fn list(&self) -> Vec<(String, Vec<String>)> {
        self.labels
            .read()
            .await
            .iter()
            .map(|l| (l.name.clone(), l.keywords.clone()))
            .collect()
    }

    /// Append a label. The name is canonicalized (lower-case, trimmed)
    /// and must not already be present.
    pub async fn add(
        &self,
        name: &str,
        keywords: Vec<String>,
        embedder: &Embedder,
    ) -> Result<()> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::InvalidInput("canonical name is empty".to_string()));
        }

        let embedding = embedder.embed(&label_text(&name, &keywords)).await;

        let mut labels = self.labels.write().await;
        if labels.iter().any(|l| l.name == name) {
            return Err(Error::InvalidInput(format!(
                "canonical '{name}' already exists"
            )));
        }
        labels.push(CanonicalLabel {
            name,
            keywords,
            embedding,
        });
        Ok(())
    }

    /// Remove a label by name. Returns whether it was present.
    pub async fn remove(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        let mut labels = self.labels.write().await;
        let before = labels.len();
        labels.retain(|l| l.name != name);
        labels.len() < before
    }

    /// Replace a label's keywords, recomputing its embedding.
    pub async fn update_keywords(
        &self,
        name: &str,
        keywords: Vec<String>,
        embedder: &Embedder,
    ) -> Result<()> {
        let name = name.trim().to_lowercase();
        // Embed outside the write lock, then re-check presence
        let embedding = embedder.embed(&label_text(&name, &keywords)).await;

        let mut labels = self.labels.write().await;
        let label = labels
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| Error::NotFound(format!("canonical '{name}'")))?;
        label.keywords = keywords;
        label.embedding = embedding;
        Ok(())
    }

    /// Resolve `text` to a canonical name.
    ///
    /// Keyword containment wins in table order. Failing that, the label
    /// with the highest embedding similarity at or above
    /// `secondary_threshold` wins. Failing both, the general category.
    pub async fn resolve(
        &self,
        text: &str,
        embedder: &Embedder,
        secondary_threshold: f32,
    ) -> String {
        let text_lower = text.to_lowercase();

        // Snapshot under the read lock; the embed call below runs without
        // it so mutations are never blocked on the backend
        let snapshot: Vec<(String, Vec<f32>)> = {
            let labels = self.labels.read().await;
            for label in labels.iter() {
                if label.keywords.iter().any(|k| text_lower.contains(k.as_str())) {
                    debug!(
                        subsystem = "engine",
                        component = "canonical",
                        op = "resolve",
                        category_name = %label.name,
                        "Keyword match"
                    );
                    return label.name.clone();
                }
            }
            labels
                .iter()
                .map(|l| (l.name.clone(), l.embedding.clone()))
                .collect()
        };

        if snapshot.is_empty() {
            return defaults::GENERAL_CATEGORY.to_string();
        }

        let query = embedder.embed(text).await;
        let mut best: Option<(&str, f32)> = None;
        for (name, embedding) in &snapshot {
            let score = cosine_similarity(&query, embedding);
            if score >= secondary_threshold
                && best.map(|(_, s)| score > s).unwrap_or(true)
            {
                best = Some((name, score));
            }
        }

        match best {
            Some((name, score)) => {
                debug!(
                    subsystem = "engine",
                    component = "canonical",
                    op = "resolve",
                    category_name = %name,
                    score,
                    "Embedding match"
                );
                name.to_string()
            }
            None => defaults::GENERAL_CATEGORY.to_string(),
        }
    }
}
