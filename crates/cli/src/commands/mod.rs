//! Command handlers for the Paperbot CLI.

pub mod ask;
pub mod context;
pub mod ingest;
pub mod serve;
pub mod stats;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
