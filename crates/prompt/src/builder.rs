//! Prompt assembly for retrieval-augmented answers.
//!
//! Retrieved chunk texts are joined with newlines into one context block and
//! rendered together with the verbatim question into [`RAG_TEMPLATE`].

use crate::templates::{RAG_TEMPLATE, RAG_TEMPLATE_NAME};
use handlebars::Handlebars;
use paperbot_core::{AppError, AppResult};
use serde::Serialize;

#[derive(Serialize)]
struct RagVariables<'a> {
    context: String,
    question: &'a str,
}

/// Renders the fixed RAG template.
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    /// Compile the built-in template.
    pub fn new() -> AppResult<Self> {
        Self::with_template(RAG_TEMPLATE)
    }

    fn with_template(template: &str) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text output: no HTML escaping, and a missing variable is a bug
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(RAG_TEMPLATE_NAME, template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Build the user prompt for `question` from the retrieved chunk texts.
    ///
    /// # Example
    /// ```
    /// use paperbot_prompt::PromptBuilder;
    ///
    /// let builder = PromptBuilder::new().unwrap();
    /// let prompt = builder.build(&["SGD uses minibatches."], "What is SGD?").unwrap();
    /// assert!(prompt.contains("SGD uses minibatches."));
    /// assert!(prompt.contains("What is SGD?"));
    /// ```
    pub fn build<S: AsRef<str>>(&self, chunks: &[S], question: &str) -> AppResult<String> {
        let variables = RagVariables {
            context: join_context(chunks),
            question,
        };

        let rendered = self
            .registry
            .render(RAG_TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        tracing::debug!(
            chunks = chunks.len(),
            prompt_len = rendered.len(),
            "Assembled prompt"
        );

        Ok(rendered)
    }
}

impl std::fmt::Debug for PromptBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptBuilder")
            .field("template", &RAG_TEMPLATE_NAME)
            .finish()
    }
}

/// Join chunk texts into the context block.
pub fn join_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}
