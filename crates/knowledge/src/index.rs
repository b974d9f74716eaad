//! SQLite-backed similarity index.
//!
//! An index is a single SQLite file with three tables: `meta` (build
//! metadata as JSON), `sources` and `chunks` (text plus the embedding as a
//! little-endian `f32` blob). [`IndexWriter`] replaces the file atomically;
//! [`SimilarityIndex`] opens it read-only and searches in memory.

use crate::types::{IndexMetadata, IndexStats, IndexedChunk, ScoredChunk, SourceRecord};
use paperbot_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

const METADATA_KEY: &str = "metadata";

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE sources (
        id TEXT PRIMARY KEY,
        path TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        chunk_count INTEGER NOT NULL
    );

    CREATE TABLE chunks (
        id TEXT PRIMARY KEY,
        source_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        FOREIGN KEY (source_id) REFERENCES sources(id)
    );

    CREATE INDEX idx_chunks_source ON chunks(source_id);
"#;

fn index_err(context: &str) -> impl Fn(rusqlite::Error) -> AppError + '_ {
    move |e| AppError::Index(format!("{}: {}", context, e))
}

/// Writes a complete index, replacing any previous file at `path`.
#[derive(Debug, Clone)]
pub struct IndexWriter {
    path: PathBuf,
}

impl IndexWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write all rows to `<path>.tmp` in one transaction, then rename it over
    /// `path`. On failure the temporary file is removed and `path` is left as
    /// it was.
    pub fn write(
        &self,
        metadata: &IndexMetadata,
        sources: &[SourceRecord],
        chunks: &[IndexedChunk],
    ) -> AppResult<()> {
        let tmp = self.tmp_path();
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }

        if let Err(e) = write_database(&tmp, metadata, sources, chunks) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::Index(format!("Failed to replace {:?}: {}", self.path, e))
        })?;

        tracing::debug!(
            "Wrote index {:?}: {} sources, {} chunks",
            self.path,
            sources.len(),
            chunks.len()
        );
        Ok(())
    }
}

fn write_database(
    path: &Path,
    metadata: &IndexMetadata,
    sources: &[SourceRecord],
    chunks: &[IndexedChunk],
) -> AppResult<()> {
    let mut conn = Connection::open(path).map_err(index_err("Failed to create index file"))?;
    conn.execute_batch(SCHEMA)
        .map_err(index_err("Failed to create tables"))?;

    let tx = conn
        .transaction()
        .map_err(index_err("Failed to begin transaction"))?;

    tx.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)",
        params![METADATA_KEY, serde_json::to_string(metadata)?],
    )
    .map_err(index_err("Failed to write metadata"))?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO sources (id, path, content_hash, size_bytes, chunk_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(index_err("Failed to prepare source insert"))?;
        for source in sources {
            stmt.execute(params![
                source.id,
                source.path,
                source.content_hash,
                source.size_bytes as i64,
                source.chunk_count as i64,
            ])
            .map_err(index_err("Failed to insert source"))?;
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO chunks (id, source_id, position, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(index_err("Failed to prepare chunk insert"))?;
        for chunk in chunks {
            if chunk.embedding.len() != metadata.dimensions {
                return Err(AppError::Index(format!(
                    "Chunk {} has {} dimensions, index expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    metadata.dimensions
                )));
            }
            stmt.execute(params![
                chunk.id,
                chunk.source_id,
                chunk.position as i64,
                chunk.text,
                embedding_to_bytes(&chunk.embedding),
            ])
            .map_err(index_err("Failed to insert chunk"))?;
        }
    }

    tx.commit().map_err(index_err("Failed to commit index"))?;
    Ok(())
}

/// An index loaded into memory for search.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    metadata: IndexMetadata,
    chunks: Vec<IndexedChunk>,
    sources_count: u32,
}

impl SimilarityIndex {
    /// Open `path` read-only and load every chunk in insertion order.
    pub fn open(path: &Path) -> AppResult<Self> {
        if !path.is_file() {
            return Err(AppError::Index(format!(
                "No index at {:?}. Run 'paperbot ingest' first.",
                path
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(index_err("Failed to open index"))?;

        let metadata = read_metadata(&conn)?;

        let mut stmt = conn
            .prepare("SELECT id, source_id, position, text, embedding FROM chunks ORDER BY rowid")
            .map_err(index_err("Failed to prepare chunk query"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(index_err("Failed to read chunks"))?;

        let mut chunks = Vec::new();
        for row in rows {
            let (id, source_id, position, text, blob) =
                row.map_err(index_err("Failed to read chunk row"))?;
            let embedding = bytes_to_embedding(&blob)?;
            if embedding.len() != metadata.dimensions {
                return Err(AppError::Index(format!(
                    "Chunk {} has {} dimensions, index metadata says {}",
                    id,
                    embedding.len(),
                    metadata.dimensions
                )));
            }
            chunks.push(IndexedChunk {
                id,
                source_id,
                position: position as u32,
                text,
                embedding,
            });
        }

        let sources_count = conn
            .query_row("SELECT COUNT(*) FROM sources", [], |row| row.get::<_, i64>(0))
            .map_err(index_err("Failed to count sources"))? as u32;

        tracing::info!(
            "Loaded index {:?}: {} chunks from {} sources ({} / {})",
            path,
            chunks.len(),
            sources_count,
            metadata.embedding_provider,
            metadata.embedding_model
        );

        Ok(Self {
            metadata,
            chunks,
            sources_count,
        })
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn sources_count(&self) -> u32 {
        self.sources_count
    }

    /// Top `k` chunks by cosine similarity to `query`, most similar first.
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        if query.len() != self.metadata.dimensions {
            return Err(AppError::Retrieval(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.metadata.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query, &chunk.embedding)))
            .collect();

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{}), scores: {:?}",
            scored.len(),
            k,
            scored.iter().map(|(_, s)| *s).collect::<Vec<_>>()
        );

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

/// Counts and metadata of the index file at `path`.
pub fn stats(path: &Path) -> AppResult<IndexStats> {
    let index = SimilarityIndex::open(path)?;
    let file_size_bytes = fs::metadata(path).map(|m| m.len())?;

    Ok(IndexStats {
        sources_count: index.sources_count(),
        chunks_count: index.len() as u32,
        file_size_bytes,
        metadata: index.metadata,
    })
}

fn read_metadata(conn: &Connection) -> AppResult<IndexMetadata> {
    let json: String = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![METADATA_KEY],
            |row| row.get(0),
        )
        .map_err(index_err("Failed to read index metadata"))?;

    serde_json::from_str(&json)
        .map_err(|e| AppError::Index(format!("Invalid index metadata: {}", e)))
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn metadata(dimensions: usize) -> IndexMetadata {
        IndexMetadata {
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            dimensions,
            chunk_size: 2000,
            chunk_overlap: 50,
            created_at: Utc::now(),
        }
    }

    fn source(id: &str, chunk_count: u32) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            path: format!("papers/{}", id),
            content_hash: "00".to_string(),
            size_bytes: 10,
            chunk_count,
        }
    }

    fn chunk(source_id: &str, position: u32, text: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: format!("{}#{}", source_id, position),
            source_id: source_id.to_string(),
            position,
            text: text.to_string(),
            embedding,
        }
    }

    fn write_sample(path: &Path) {
        IndexWriter::new(path)
            .write(
                &metadata(3),
                &[source("a.tex", 2), source("b.tex", 1)],
                &[
                    chunk("a.tex", 0, "x axis", vec![1.0, 0.0, 0.0]),
                    chunk("a.tex", 1, "y axis", vec![0.0, 1.0, 0.0]),
                    chunk("b.tex", 0, "diagonal", vec![0.7, 0.7, 0.0]),
                ],
            )
            .unwrap();
    }

    #[test]
    fn test_write_and_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);

        let index = SimilarityIndex::open(&path).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.sources_count(), 2);
        assert_eq!(index.metadata().dimensions, 3);
        assert!(!temp.path().join("index.sqlite.tmp").exists());
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);
        let index = SimilarityIndex::open(&path).unwrap();

        let results = index.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "x axis");
        assert_eq!(results[1].chunk.text, "diagonal");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        IndexWriter::new(&path)
            .write(
                &metadata(2),
                &[source("a.tex", 3)],
                &[
                    chunk("a.tex", 0, "first", vec![1.0, 0.0]),
                    chunk("a.tex", 1, "second", vec![1.0, 0.0]),
                    chunk("a.tex", 2, "third", vec![1.0, 0.0]),
                ],
            )
            .unwrap();

        let index = SimilarityIndex::open(&path).unwrap();
        let texts: Vec<_> = index
            .search(&[1.0, 0.0], 3)
            .unwrap()
            .into_iter()
            .map(|s| s.chunk.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_search_fewer_chunks_than_k() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);

        let index = SimilarityIndex::open(&path).unwrap();
        assert_eq!(index.search(&[0.0, 0.0, 1.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_search_rejects_wrong_dimensions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);

        let index = SimilarityIndex::open(&path).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0], 3),
            Err(AppError::Retrieval(_))
        ));
    }

    #[test]
    fn test_open_missing_index() {
        let temp = TempDir::new().unwrap();
        let result = SimilarityIndex::open(&temp.path().join("index.sqlite"));
        assert!(matches!(result, Err(AppError::Index(_))));
    }

    #[test]
    fn test_open_corrupt_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        fs::write(&path, "definitely not sqlite").unwrap();

        assert!(matches!(SimilarityIndex::open(&path), Err(AppError::Index(_))));
    }

    #[test]
    fn test_failed_write_keeps_previous_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);

        let result = IndexWriter::new(&path).write(
            &metadata(3),
            &[source("c.tex", 1)],
            &[chunk("c.tex", 0, "short vector", vec![1.0])],
        );
        assert!(matches!(result, Err(AppError::Index(_))));
        assert!(!temp.path().join("index.sqlite.tmp").exists());

        let index = SimilarityIndex::open(&path).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_rewrite_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_sample(&path);

        IndexWriter::new(&path)
            .write(
                &metadata(3),
                &[source("c.tex", 1)],
                &[chunk("c.tex", 0, "only", vec![0.0, 0.0, 1.0])],
            )
            .unwrap();

        let stats = stats(&path).unwrap();
        assert_eq!(stats.chunks_count, 1);
        assert_eq!(stats.sources_count, 1);
        assert!(stats.file_size_bytes > 0);
    }

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
