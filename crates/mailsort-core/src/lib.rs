//! # mailsort-core
//!
//! Core types, traits, and abstractions for the mailsort library.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other mailsort crates depend on: the category and job
//! models, repository seams, text normalization, thread-continuation
//! heuristics, and runtime configuration.

pub mod config;
pub mod defaults;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod models;
pub mod text;
pub mod thread;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use fingerprint::content_fingerprint;
pub use models::*;
pub use traits::*;
