//! LLM integration crate for Paperbot.
//!
//! Provider-agnostic chat completion behind the [`LlmClient`] trait.
//!
//! # Providers
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use paperbot_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2").with_system("Be brief.");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role};
pub use factory::create_client;
pub use providers::OllamaClient;
