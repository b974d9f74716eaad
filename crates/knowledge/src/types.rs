//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document read from the papers directory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name, used as the source identifier
    pub id: String,

    /// Full path the document was read from
    pub path: PathBuf,

    /// Raw file content
    pub content: String,

    /// Hex SHA-256 of the raw content
    pub content_hash: String,
}

impl SourceDocument {
    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A span of cleaned text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Source document identifier
    pub source_id: String,

    /// Position within the source (0-indexed)
    pub position: u32,

    /// Chunk text
    pub text: String,

    /// Character range `[start, end)` in the cleaned source text
    pub char_range: (usize, usize),
}

/// A chunk stored in the index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Stable identifier: `<source_id>#<position>`
    pub id: String,

    pub source_id: String,

    pub position: u32,

    pub text: String,

    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: format!("{}#{}", chunk.source_id, chunk.position),
            source_id: chunk.source_id,
            position: chunk.position,
            text: chunk.text,
            embedding,
        }
    }
}

/// A search hit, most similar first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: IndexedChunk,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Per-source row kept in the index for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub path: String,
    pub content_hash: String,
    pub size_bytes: u64,
    pub chunk_count: u32,
}

/// Metadata describing how an index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
}

/// Options for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Directory scanned for documents (created if absent)
    pub papers_dir: PathBuf,

    /// Directory the index is written to (created if absent)
    pub index_dir: PathBuf,

    /// Eligible file extension, without the dot
    pub extension: String,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Texts per embedding request
    pub batch_size: usize,
}

/// Statistics from a successful ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Documents that contributed chunks
    pub files_indexed: u32,

    /// Documents that could not be read or decoded
    pub skipped_files: Vec<String>,

    /// Chunks written to the index
    pub chunks_count: u32,

    /// Raw bytes read
    pub bytes_processed: u64,

    /// Written index file
    pub index_path: PathBuf,

    pub duration_secs: f64,
}

/// Result of an ingestion run.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// A new index replaced the previous one
    Indexed(IngestStats),

    /// There was nothing to index; no file was written
    NothingToIndex {
        /// Eligible files that were skipped because they could not be read
        skipped_files: Vec<String>,
    },
}

/// Statistics for a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub sources_count: u32,
    pub chunks_count: u32,
    pub file_size_bytes: u64,
    pub metadata: IndexMetadata,
}
