//! Ollama embedding provider.
//!
//! Calls the local `/api/embeddings` endpoint once per text (the API has no
//! batch form) and retries transient failures with exponential backoff.
//!
//! # Example
//! ```no_run
//! use paperbot_knowledge::embeddings::EmbeddingProvider;
//! use paperbot_knowledge::embeddings::providers::OllamaProvider;
//!
//! # async fn run() -> paperbot_core::AppResult<()> {
//! let provider = OllamaProvider::new("http://localhost:11434", "all-minilm".to_string(), 384)?;
//! provider.verify_connection().await?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 384);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use paperbot_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Maximum attempts per text
const MAX_RETRIES: u32 = 3;

/// Backoff before the second attempt, doubled after each failure
const INITIAL_BACKOFF_MS: u64 = 100;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `base_url`.
    ///
    /// No request is made; call [`OllamaProvider::verify_connection`] to
    /// check the server and model.
    pub fn new(base_url: &str, model: String, dimensions: usize) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }

    /// Embed a probe text and check the returned dimensions.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama embeddings at {}", self.base_url);

        match self.embed_with_retries("test connection").await {
            Ok(_) => {
                debug!("Embedding model '{}' ready", self.model);
                Ok(())
            }
            Err(Failure::Permanent(e)) => Err(e),
            Err(Failure::Transient(e)) => Err(AppError::Embedding(format!(
                "Ollama not available at {} ({}). Ensure Ollama is running and run: ollama pull {}",
                self.base_url, e, self.model
            ))),
        }
    }

    async fn embed_with_retries(&self, text: &str) -> Result<Vec<f32>, Failure> {
        let mut attempt = 0;

        loop {
            match self.embed_single(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(Failure::Transient(e)) if attempt + 1 < MAX_RETRIES => {
                    attempt += 1;
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(failure) => return Err(failure),
            }
        }
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, Failure> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Failure::Transient(AppError::Embedding(format!(
                    "Failed to send request to Ollama: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|r| r.error)
                .unwrap_or(body);
            let error = AppError::Embedding(format!("Ollama API error ({}): {}", status, message));
            // Client errors (unknown model, bad request) will not improve on retry
            return Err(if status.is_client_error() {
                Failure::Permanent(error)
            } else {
                Failure::Transient(error)
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| {
                Failure::Permanent(AppError::Embedding(format!(
                    "Failed to parse Ollama response: {}",
                    e
                )))
            })?;

        if body.embedding.len() != self.dimensions {
            return Err(Failure::Permanent(AppError::Embedding(format!(
                "Model '{}' returned {} dimensions, expected {}",
                self.model,
                body.embedding.len(),
                self.dimensions
            ))));
        }

        Ok(body.embedding)
    }
}

/// Outcome of a failed request: whether another attempt may succeed.
enum Failure {
    Transient(AppError),
    Permanent(AppError),
}

impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Transient(e) | Failure::Permanent(e) => e,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!("Empty text at index {}, using zero vector", i);
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }

            embeddings.push(self.embed_with_retries(text).await?);
        }

        Ok(embeddings)
    }
}
