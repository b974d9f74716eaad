//! Stats command handler.
//!
//! Shows what the persisted index contains.

use clap::Args;
use paperbot_core::{config::AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let index_file = config.index_file();
        let stats = paperbot_knowledge::stats(&index_file)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        let metadata = &stats.metadata;
        println!("Index: {}", index_file.display());
        println!("Sources: {}", stats.sources_count);
        println!("Chunks: {}", stats.chunks_count);
        println!(
            "Embedding: {} / {} ({} dims)",
            metadata.embedding_provider, metadata.embedding_model, metadata.dimensions
        );
        println!(
            "Chunking: {} chars, {} overlap",
            metadata.chunk_size, metadata.chunk_overlap
        );
        println!("Created: {}", metadata.created_at.to_rfc3339());
        println!("Size: {} bytes", stats.file_size_bytes);

        Ok(())
    }
}
