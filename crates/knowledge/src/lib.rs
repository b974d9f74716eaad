//! Paper knowledge base.
//!
//! Ingests LaTeX sources into a persisted SQLite similarity index and answers
//! questions by retrieving the closest chunks and passing them to a language
//! model.
//!
//! - [`ingest::ingest`]: documents → preprocess → chunks → embeddings → index
//! - [`pipeline::QueryContext::answer`]: question → top chunks → prompt → answer

pub mod answer;
pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod parser;
pub mod pipeline;
pub mod preprocess;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

pub use answer::AnswerGenerator;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::{stats, IndexWriter, SimilarityIndex};
pub use ingest::ingest;
pub use pipeline::{Answer, QueryContext};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use types::{
    Chunk, IndexMetadata, IndexStats, IngestOptions, IngestOutcome, IngestStats, ScoredChunk,
};
