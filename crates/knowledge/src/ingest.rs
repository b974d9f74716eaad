//! Ingestion pipeline: documents in, persisted index out.

use crate::chunker::{chunk_text, ChunkSettings};
use crate::embeddings::EmbeddingProvider;
use crate::index::IndexWriter;
use crate::parser::{discover_documents, read_document};
use crate::preprocess::preprocess;
use crate::types::{
    Chunk, IndexMetadata, IndexedChunk, IngestOptions, IngestOutcome, IngestStats, SourceRecord,
};
use chrono::Utc;
use paperbot_core::config::INDEX_FILE_NAME;
use paperbot_core::{AppError, AppResult};
use std::fs;
use std::time::Instant;

/// Build a fresh index from every eligible document in `options.papers_dir`.
///
/// Documents that cannot be read or decoded are skipped and reported. If
/// nothing yields a chunk, no file is written and
/// [`IngestOutcome::NothingToIndex`] is returned. Embedding failures abort the
/// run before the index file is touched.
pub async fn ingest(
    options: &IngestOptions,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<IngestOutcome> {
    let start = Instant::now();
    let settings = ChunkSettings::new(options.chunk_size, options.chunk_overlap)?;

    fs::create_dir_all(&options.papers_dir)?;
    fs::create_dir_all(&options.index_dir)?;

    tracing::info!(
        "Starting ingestion from {:?} (provider: {}, model: {})",
        options.papers_dir,
        embedder.provider_name(),
        embedder.model_name()
    );

    let discovery = discover_documents(&options.papers_dir, &options.extension)?;
    let paths = discovery.paths;

    let mut sources = Vec::new();
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut skipped_files: Vec<String> = discovery
        .skipped
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let mut bytes_processed = 0u64;

    for path in &paths {
        let document = match read_document(path) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error.kind = %e.kind(), "Skipping {:?}: {}", path, e);
                skipped_files.push(path.to_string_lossy().into_owned());
                continue;
            }
        };

        let cleaned = preprocess(&document.content);
        let document_chunks = chunk_text(&document.id, &cleaned, settings);
        tracing::debug!("{}: {} chunks", document.id, document_chunks.len());

        bytes_processed += document.size_bytes();
        sources.push(SourceRecord {
            id: document.id.clone(),
            path: document.path.to_string_lossy().into_owned(),
            content_hash: document.content_hash.clone(),
            size_bytes: document.size_bytes(),
            chunk_count: document_chunks.len() as u32,
        });
        chunks.extend(document_chunks);
    }

    if chunks.is_empty() {
        tracing::warn!(
            "Nothing to index in {:?} ({} eligible files, {} skipped)",
            options.papers_dir,
            paths.len(),
            skipped_files.len()
        );
        return Ok(IngestOutcome::NothingToIndex { skipped_files });
    }

    let embeddings = embed_all(&chunks, embedder, options.batch_size).await?;

    let indexed: Vec<IndexedChunk> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexedChunk::from_chunk(chunk, embedding))
        .collect();

    let metadata = IndexMetadata {
        embedding_provider: embedder.provider_name().to_string(),
        embedding_model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        chunk_size: options.chunk_size,
        chunk_overlap: options.chunk_overlap,
        created_at: Utc::now(),
    };

    let index_path = options.index_dir.join(INDEX_FILE_NAME);
    IndexWriter::new(&index_path).write(&metadata, &sources, &indexed)?;

    let stats = IngestStats {
        files_indexed: sources.iter().filter(|s| s.chunk_count > 0).count() as u32,
        skipped_files,
        chunks_count: indexed.len() as u32,
        bytes_processed,
        index_path,
        duration_secs: start.elapsed().as_secs_f64(),
    };

    tracing::info!(
        "Ingestion completed: {} files, {} chunks, {} bytes in {:.2}s ({} skipped)",
        stats.files_indexed,
        stats.chunks_count,
        stats.bytes_processed,
        stats.duration_secs,
        stats.skipped_files.len()
    );

    Ok(IngestOutcome::Indexed(stats))
}

async fn embed_all(
    chunks: &[Chunk],
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut embeddings = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        tracing::debug!("Embedding batch {}/{}", i + 1, total_batches);
        let batch_embeddings = embedder.embed_batch(batch).await?;

        if batch_embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                batch_embeddings.len(),
                batch.len()
            )));
        }
        if let Some(bad) = batch_embeddings
            .iter()
            .find(|e| e.len() != embedder.dimensions())
        {
            return Err(AppError::Embedding(format!(
                "Provider returned {} dimensions, expected {}",
                bad.len(),
                embedder.dimensions()
            )));
        }

        embeddings.extend(batch_embeddings);
    }

    Ok(embeddings)
}
