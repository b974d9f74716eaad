//! Front-end agnostic conversation handling.
//!
//! Every inbound event maps to a fixed set of outbound actions on a
//! [`ReplySink`]. Failures of a question never escape
//! [`ConversationHandler::handle_question`]; they are logged and replaced by
//! one of two fixed notices.

use crate::messages::{
    ABOUT_AUTHOR, ABOUT_AUTHOR_CALLBACK, ABOUT_BUTTON_LABEL, ACK_NOTICE, GENERIC_FAILURE_NOTICE,
    GREETING, MODEL_FAILURE_NOTICE,
};
use async_trait::async_trait;
use paperbot_core::{AppError, AppResult};
use paperbot_knowledge::QueryContext;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// An inline button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

/// Outbound side of one conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send a new text message.
    async fn send_text(&self, text: &str) -> AppResult<()>;

    /// Send a new text message with one row of inline buttons.
    async fn send_with_buttons(&self, text: &str, buttons: &[Button]) -> AppResult<()>;

    /// Replace the text of the message that triggered the current event.
    async fn edit_text(&self, text: &str) -> AppResult<()>;
}

/// Maps questions, commands and button presses onto replies.
#[derive(Debug)]
pub struct ConversationHandler {
    context: Arc<QueryContext>,
    permits: Arc<Semaphore>,
}

impl ConversationHandler {
    /// At most `max_concurrent_requests` questions run retrieval and
    /// generation at once; the rest wait after their acknowledgement.
    pub fn new(context: Arc<QueryContext>, max_concurrent_requests: usize) -> Self {
        Self {
            context,
            permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Acknowledge, answer, and reply. Sends exactly one answer or notice
    /// after the acknowledgement.
    pub async fn handle_question(&self, question: &str, sink: &dyn ReplySink) {
        if let Err(e) = sink.send_text(ACK_NOTICE).await {
            tracing::warn!(error.kind = %e.kind(), "Failed to send acknowledgement: {}", e);
        }

        let reply = match self.answer(question).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error.kind = %e.kind(), "Failed to answer question: {}", e);
                failure_notice(&e).to_string()
            }
        };

        if let Err(e) = sink.send_text(&reply).await {
            tracing::error!(error.kind = %e.kind(), "Failed to send reply: {}", e);
        }
    }

    async fn answer(&self, question: &str) -> AppResult<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Other(format!("Worker pool closed: {}", e)))?;

        let answer = self.context.answer(question).await?;
        if answer.text.trim().is_empty() {
            return Err(AppError::Llm("Model returned an empty answer".to_string()));
        }

        Ok(answer.text)
    }

    /// Greeting with the about button.
    pub async fn handle_start(&self, sink: &dyn ReplySink) -> AppResult<()> {
        sink.send_with_buttons(GREETING, &[about_button()]).await
    }

    /// Handle a button press. Unknown callback data is ignored.
    pub async fn handle_callback(&self, data: &str, sink: &dyn ReplySink) -> AppResult<()> {
        match data {
            ABOUT_AUTHOR_CALLBACK => sink.edit_text(ABOUT_AUTHOR).await,
            other => {
                tracing::debug!("Ignoring unknown callback data: {:?}", other);
                Ok(())
            }
        }
    }
}

fn about_button() -> Button {
    Button {
        label: ABOUT_BUTTON_LABEL.to_string(),
        callback_data: ABOUT_AUTHOR_CALLBACK.to_string(),
    }
}

/// The notice shown to the user for a failed question.
pub fn failure_notice(error: &AppError) -> &'static str {
    if error.is_generation_failure() {
        MODEL_FAILURE_NOTICE
    } else {
        GENERIC_FAILURE_NOTICE
    }
}
