//! Query context construction shared by `serve` and `ask`.

use paperbot_core::{config::AppConfig, AppResult};
use paperbot_knowledge::{
    create_provider, AnswerGenerator, QueryContext, Retriever, SimilarityIndex,
};
use paperbot_llm::create_client;
use paperbot_prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
use std::sync::Arc;
use std::time::Duration;

/// Load the index and wire retriever, prompt builder and generator.
///
/// Fails if the model is not configured, the index is missing or unreadable,
/// or the embedder does not match the one the index was built with.
pub async fn build_query_context(config: &AppConfig) -> AppResult<QueryContext> {
    let model = config.require_model()?;

    let index = SimilarityIndex::open(&config.index_file())?;
    if index.is_empty() {
        tracing::warn!("Index {:?} holds no chunks", config.index_file());
    }

    let embedder = create_provider(&config.embedding, &config.llm.endpoint).await?;
    let retriever = Retriever::new(Arc::new(index), embedder)?;

    let client = create_client("ollama", Some(&config.llm.endpoint))?;
    let generator = AnswerGenerator::new(
        client,
        model,
        SYSTEM_INSTRUCTION,
        Duration::from_secs(config.llm.timeout_secs),
    );

    Ok(QueryContext::new(retriever, PromptBuilder::new()?, generator))
}
