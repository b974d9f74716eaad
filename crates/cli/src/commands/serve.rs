//! Serve command handler.
//!
//! Runs the Telegram bot over the persisted index.

use super::context::build_query_context;
use clap::Args;
use paperbot_bot::{ConversationHandler, TelegramFrontend};
use paperbot_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Run the Telegram bot
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Questions answered at the same time (overrides bot.maxConcurrentRequests)
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        // Both required settings are checked before anything is loaded
        let token = config.require_bot_token()?;
        config.require_model()?;

        let context = build_query_context(config).await?;
        let max_concurrent = self
            .max_concurrent
            .unwrap_or(config.bot.max_concurrent_requests);
        tracing::info!(
            "Serving {} chunks with up to {} concurrent questions",
            context.retriever().index().len(),
            max_concurrent
        );

        let handler = Arc::new(ConversationHandler::new(Arc::new(context), max_concurrent));
        TelegramFrontend::new(token, handler).run().await
    }
}
