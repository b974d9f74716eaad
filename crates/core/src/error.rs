//! Error types for Paperbot.
//!
//! One enum covers every failure class of the ingestion pipeline and the
//! query service. Callers branch on the variant (or on [`ErrorKind`]) rather
//! than on message text.

use thiserror::Error;

/// Unified error type for Paperbot.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or decoding a source document failed
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persisted index could not be written, opened or read
    #[error("Index error: {0}")]
    Index(String),

    /// Similarity search failed at query time
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Language model transport or model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// An external call did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Messaging front-end errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`AppError`], used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Ingest,
    Embedding,
    Index,
    Retrieval,
    Llm,
    Timeout,
    Prompt,
    Channel,
    Serialization,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Io => "io",
            Self::Ingest => "ingest",
            Self::Embedding => "embedding",
            Self::Index => "index",
            Self::Retrieval => "retrieval",
            Self::Llm => "llm",
            Self::Timeout => "timeout",
            Self::Prompt => "prompt",
            Self::Channel => "channel",
            Self::Serialization => "serialization",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Ingest(_) => ErrorKind::Ingest,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Index(_) => ErrorKind::Index,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Llm(_) => ErrorKind::Llm,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Prompt(_) => ErrorKind::Prompt,
            Self::Channel(_) => ErrorKind::Channel,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// True for failures of the answer-generation step (model error or timeout).
    pub fn is_generation_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Llm | ErrorKind::Timeout)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
