//! The query pipeline: retrieve, assemble the prompt, generate.

use crate::answer::AnswerGenerator;
use crate::retriever::Retriever;
use crate::types::ScoredChunk;
use paperbot_core::AppResult;
use paperbot_prompt::PromptBuilder;
use serde::Serialize;

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub chunks: Vec<ScoredChunk>,
}

/// Everything a question needs, built once at start-up and shared.
#[derive(Debug)]
pub struct QueryContext {
    retriever: Retriever,
    prompt: PromptBuilder,
    generator: AnswerGenerator,
}

impl QueryContext {
    pub fn new(retriever: Retriever, prompt: PromptBuilder, generator: AnswerGenerator) -> Self {
        Self {
            retriever,
            prompt,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `question` from the top chunks of the index.
    #[tracing::instrument(skip_all, fields(question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> AppResult<Answer> {
        let chunks = self.retriever.retrieve(question).await?;
        let texts: Vec<&str> = chunks.iter().map(|c| c.chunk.text.as_str()).collect();
        let prompt = self.prompt.build(&texts, question)?;
        let text = self.generator.generate(&prompt).await?;

        tracing::info!(
            "Answered with {} context chunks ({} chars)",
            chunks.len(),
            text.len()
        );

        Ok(Answer { text, chunks })
    }
}
