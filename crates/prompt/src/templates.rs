//! Compiled-in prompt texts.

/// Name the RAG template is registered under.
pub const RAG_TEMPLATE_NAME: &str = "rag";

/// User prompt wrapping the retrieved context and the question.
pub const RAG_TEMPLATE: &str = "
Using the following context, answer the question. If the context does not contain the answer, say so explicitly.

Context:
{{context}}

Question:
{{question}}

Answer:
";

/// Persona sent as the system message with every question.
pub const SYSTEM_INSTRUCTION: &str = "You are a Telegram assistant bot that helps people \
understand the author's papers on optimization and machine learning.";
