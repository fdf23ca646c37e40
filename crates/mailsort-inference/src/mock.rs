//! Mock embedding backend for deterministic testing.
//!
//! Generates stable pseudo-random unit vectors seeded from the input text,
//! so the same text always embeds identically within and across tests.
//! Specific texts can be pinned to exact vectors to construct known
//! similarity relationships.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};

use mailsort_core::{EmbeddingBackend, Error, Result};

/// Mock embedding backend for testing.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    pinned: HashMap<String, Vec<f32>>,
    fail: bool,
    healthy: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            pinned: HashMap::new(),
            fail: false,
            healthy: true,
        }
    }
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Pin a specific text to an exact vector.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config).pinned.insert(text.into(), vector);
        self
    }

    /// Make every embed call fail.
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Make health checks report unavailable.
    pub fn with_unhealthy(mut self) -> Self {
        Arc::make_mut(&mut self.config).healthy = false;
        self
    }

    /// Get all embedded inputs for assertion.
    pub fn get_calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of embed calls made.
    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    fn deterministic_vector(&self, text: &str) -> Vec<f32> {
        if let Some(pinned) = self.config.pinned.get(text) {
            return pinned.clone();
        }

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = rand::rngs::StdRng::seed_from_u64(hasher.finish());

        let mut vector: Vec<f32> = (0..self.config.dimension)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        // Normalize to unit length so cosine similarity behaves sanely
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        {
            let mut log = self.call_log.lock().unwrap();
            log.extend(texts.iter().cloned());
        }

        if self.config.fail {
            return Err(Error::Embedding("mock backend failure".to_string()));
        }

        Ok(texts.iter().map(|t| self.deterministic_vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.config.healthy)
    }
}
