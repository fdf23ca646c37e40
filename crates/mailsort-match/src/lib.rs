//! # mailsort-match
//!
//! Similarity matching for mailsort: cosine similarity and the
//! [`SimilarityMatcher`], which picks between database-native vector
//! search and a bounded in-memory scan.

pub mod matcher;
pub mod similarity;

pub use matcher::SimilarityMatcher;
pub use similarity::cosine_similarity;
