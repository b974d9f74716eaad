//! Prompt assembly for Paperbot.
//!
//! The RAG template and the bot persona are compiled in; nothing here is
//! customisable at run time.

pub mod builder;
pub mod templates;

pub use builder::{join_context, PromptBuilder};
pub use templates::{RAG_TEMPLATE, SYSTEM_INSTRUCTION};
