//! # mailsort-inference
//!
//! Embedding backends for mailsort: the Ollama HTTP backend, a bounded
//! TTL cache, and the caching [`Embedder`] that the categorization engine
//! talks to. Embedding is best-effort; callers always get a vector
//! back, possibly the zero vector when the backend is down.

pub mod cache;
pub mod embedder;
pub mod mock;
pub mod ollama;

pub use cache::{cache_key, EmbeddingCache};
pub use embedder::Embedder;
pub use mock::MockEmbeddingBackend;
pub use ollama::OllamaBackend;
