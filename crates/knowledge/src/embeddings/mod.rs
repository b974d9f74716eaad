//! Embedding providers.
//!
//! The same provider embeds chunks at ingestion time and questions at query
//! time; the index records which provider, model and dimensionality built it.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
