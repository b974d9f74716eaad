//! Answer generation with a bounded wait on the model.

use paperbot_core::{AppError, AppResult};
use paperbot_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;

/// Sends an assembled prompt to the model under a fixed system instruction.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    system: String,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        system: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            system: system.into(),
            timeout,
        }
    }

    /// Generate the answer text for `prompt`.
    ///
    /// Transport and model failures are `AppError::Llm`. If no reply arrives
    /// within the timeout the request is dropped and `AppError::Timeout` is
    /// returned.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_system(&self.system);

        tracing::debug!(
            "Generating with {} model '{}' (prompt: {} chars)",
            self.client.provider_name(),
            self.model,
            prompt.len()
        );

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "Model '{}' did not answer within {}s",
                    self.model,
                    self.timeout.as_secs_f64()
                ))
            })??;

        tracing::debug!(
            "Generation used {} prompt + {} completion tokens",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        Ok(response.content)
    }
}

impl std::fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerGenerator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paperbot_llm::{LlmResponse, LlmUsage, Role};
    use std::sync::Mutex;

    struct EchoClient {
        delay: Duration,
        seen: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmClient for EchoClient {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            let last = request.messages.last().map(|m| m.content.clone());
            Ok(LlmResponse {
                content: format!("echo: {}", last.unwrap_or_default()),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    struct BrokenClient;

    #[async_trait]
    impl LlmClient for BrokenClient {
        fn provider_name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::Llm("model 'llama3' not found".to_string()))
        }
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_prompt() {
        let client = Arc::new(EchoClient {
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        });
        let generator =
            AnswerGenerator::new(client.clone(), "llama3", "Be helpful.", Duration::from_secs(5));

        let answer = generator.generate("Question?").await.unwrap();
        assert_eq!(answer, "echo: Question?");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].model, "llama3");
        assert_eq!(seen[0].messages[0].role, Role::System);
        assert_eq!(seen[0].messages[0].content, "Be helpful.");
        assert_eq!(seen[0].messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let client = Arc::new(EchoClient {
            delay: Duration::from_secs(30),
            seen: Mutex::new(Vec::new()),
        });
        let generator = AnswerGenerator::new(client, "llama3", "", Duration::from_millis(50));

        let err = generator.generate("slow").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert!(err.is_generation_failure());
    }

    #[tokio::test]
    async fn test_generate_propagates_model_error() {
        let generator =
            AnswerGenerator::new(Arc::new(BrokenClient), "llama3", "", Duration::from_secs(5));

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
