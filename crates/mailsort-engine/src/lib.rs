//! # mailsort-engine
//!
//! The categorization engine: canonical label resolution and the
//! standalone/threaded decision flows over the category store.

pub mod canonical;
pub mod engine;

pub use canonical::{CanonicalLabel, CanonicalLabels};
pub use engine::CategorizationEngine;
