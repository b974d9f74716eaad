//! Question-to-chunks retrieval over a loaded index.

use crate::embeddings::EmbeddingProvider;
use crate::index::SimilarityIndex;
use crate::types::ScoredChunk;
use paperbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Chunks passed to the prompt for each question.
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds questions and searches a [`SimilarityIndex`].
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<SimilarityIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Pair an index with the embedder used at query time.
    ///
    /// The embedder must be the provider, model and dimensionality the index
    /// was built with; otherwise similarity scores would be meaningless.
    pub fn new(index: Arc<SimilarityIndex>, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let metadata = index.metadata();
        if metadata.embedding_provider != embedder.provider_name()
            || metadata.embedding_model != embedder.model_name()
            || metadata.dimensions != embedder.dimensions()
        {
            return Err(AppError::Index(format!(
                "Index was built with {}/{} ({} dims) but the configured embedder is {}/{} ({} dims). Re-run 'paperbot ingest'.",
                metadata.embedding_provider,
                metadata.embedding_model,
                metadata.dimensions,
                embedder.provider_name(),
                embedder.model_name(),
                embedder.dimensions()
            )));
        }

        Ok(Self { index, embedder })
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// The [`DEFAULT_TOP_K`] chunks most similar to `question`, most similar first.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<ScoredChunk>> {
        let query = self.embedder.embed(question).await?;
        let results = self.index.search(&query, DEFAULT_TOP_K)?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "Top chunk {} (score {:.3}) of {} retrieved",
                best.chunk.id,
                best.score,
                results.len()
            );
        }

        Ok(results)
    }
}
