//! Ask command handler.
//!
//! Answers one question from the command line, bypassing Telegram.

use super::context::build_query_context;
use clap::Args;
use paperbot_core::{config::AppConfig, AppResult};

/// Answer a single question against the index
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Also print the retrieved chunks and their scores
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let context = build_query_context(config).await?;
        let answer = context.answer(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
            return Ok(());
        }

        println!("{}", answer.text);

        if self.show_context {
            println!();
            println!("Context:");
            for scored in &answer.chunks {
                println!("- {} (score {:.3})", scored.chunk.id, scored.score);
            }
        }

        Ok(())
    }
}
