//! Paperbot CLI
//!
//! Main entry point for the paperbot command-line tool: build the paper
//! index, serve questions over Telegram, or query the index directly.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, ServeCommand, StatsCommand};
use paperbot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Paperbot - answer questions about research papers over Telegram
#[derive(Parser, Debug)]
#[command(name = "paperbot")]
#[command(about = "Retrieval-augmented Telegram bot for research papers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PAPERBOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/paperbot.yaml)
    #[arg(short, long, global = true, env = "PAPERBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Chat model identifier (overrides OLLAMA_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the search index from the papers directory
    Ingest(IngestCommand),

    /// Run the Telegram bot
    Serve(ServeCommand),

    /// Answer a single question against the index
    Ask(AskCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Serve(_) => "serve",
            Commands::Ask(_) => "ask",
            Commands::Stats(_) => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load(cli.workspace, cli.config)?.with_overrides(
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("Paperbot starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Config file: {:?}", config.config_file);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match &cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(error.kind = %e.kind(), "Command failed: {}", e),
    }

    result
}
