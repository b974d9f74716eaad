//! Ingest command handler.
//!
//! Builds the index from the papers directory.

use clap::Args;
use paperbot_core::{config::AppConfig, AppResult};
use paperbot_knowledge::{create_provider, IngestOptions, IngestOutcome};

/// Build the search index from the papers directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let options = IngestOptions {
            papers_dir: config.papers_dir(),
            index_dir: config.index_dir(),
            extension: config.ingest.extension.clone(),
            chunk_size: config.ingest.chunk_size,
            chunk_overlap: config.ingest.chunk_overlap,
            batch_size: config.embedding.batch_size,
        };

        let embedder = create_provider(&config.embedding, &config.llm.endpoint).await?;
        let outcome = paperbot_knowledge::ingest(&options, embedder.as_ref()).await?;

        match outcome {
            IngestOutcome::Indexed(stats) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!(
                        "Indexed {} files ({} chunks, {} bytes) in {:.2}s",
                        stats.files_indexed,
                        stats.chunks_count,
                        stats.bytes_processed,
                        stats.duration_secs
                    );
                    println!("Index saved to {}", stats.index_path.display());
                    print_skipped(&stats.skipped_files);
                }
            }
            IngestOutcome::NothingToIndex { skipped_files } => {
                if self.json {
                    let output = serde_json::json!({
                        "nothingToIndex": true,
                        "skippedFiles": skipped_files,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!(
                        "Nothing to index: no usable .{} files in {}",
                        options.extension,
                        options.papers_dir.display()
                    );
                    print_skipped(&skipped_files);
                }
            }
        }

        Ok(())
    }
}

fn print_skipped(skipped: &[String]) {
    if skipped.is_empty() {
        return;
    }
    println!("Skipped {} unreadable files:", skipped.len());
    for path in skipped {
        println!("- {}", path);
    }
}
