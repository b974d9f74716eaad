//! Text chunking with configurable size and overlap.
//!
//! Chunks are windows of `chunk_size` characters (Unicode scalar values)
//! advancing by `chunk_size - overlap`, so every chunk after the first starts
//! with the last `overlap` characters of its predecessor. The final window is
//! cut at the end of the text.

use crate::types::Chunk;
use paperbot_core::{AppError, AppResult};

/// Size bounds for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkSettings {
    /// Validated settings: `chunk_size > 0` and `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Chunk cleaned text into overlapping segments.
pub fn chunk_text(source_id: &str, text: &str, settings: ChunkSettings) -> Vec<Chunk> {
    if text.is_empty() {
        return vec![];
    }

    // Byte offset of every char boundary, plus the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut position = 0u32;

    loop {
        let end = start.saturating_add(settings.chunk_size).min(char_count);

        chunks.push(Chunk {
            source_id: source_id.to_string(),
            position,
            text: text[boundaries[start]..boundaries[end]].to_string(),
            char_range: (start, end),
        });

        if end == char_count {
            break;
        }

        position += 1;
        start += settings.step();
    }

    tracing::debug!(
        "Chunked {} chars from '{}' into {} chunks (size: {}, overlap: {})",
        char_count,
        source_id,
        chunks.len(),
        settings.chunk_size,
        settings.overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(size: usize, overlap: usize) -> ChunkSettings {
        ChunkSettings::new(size, overlap).unwrap()
    }

    /// Drop each chunk's leading overlap and concatenate.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    c.text.clone()
                } else {
                    c.text.chars().skip(overlap).collect()
                }
            })
            .collect()
    }

    #[test]
    fn test_settings_validation() {
        assert!(ChunkSettings::new(0, 0).is_err());
        assert!(ChunkSettings::new(100, 100).is_err());
        assert!(ChunkSettings::new(100, 150).is_err());
        assert!(ChunkSettings::new(100, 99).is_ok());
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("paper.tex", "", settings(100, 10)).is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let text = "Gradient descent converges under convexity assumptions.";
        let chunks = chunk_text("paper.tex", text, settings(2000, 50));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].char_range, (0, text.chars().count()));
    }

    #[test]
    fn test_exact_size_is_single_chunk() {
        let text = "x".repeat(100);
        assert_eq!(chunk_text("s", &text, settings(100, 10)).len(), 1);
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(300);
        let chunks = chunk_text("s", &text, settings(100, 0));

        assert_eq!(chunks.len(), 3);
        assert_eq!(reconstruct(&chunks, 0), text);
    }

    #[test]
    fn test_bounds_and_overlap() {
        let text: String = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let chunks = chunk_text("s", &text, settings(50, 10));

        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 50);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count() - 10)
                .collect();
            let head: String = pair[1].text.chars().take(10).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(reconstruct(&chunks, 10), text);
    }

    #[test]
    fn test_positions_are_sequential() {
        let text = "word ".repeat(100);
        let chunks = chunk_text("s", &text, settings(64, 8));

        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.position as usize, i);
            assert_eq!(c.source_id, "s");
        }
        assert_eq!(chunks.last().unwrap().char_range.1, text.chars().count());
    }

    #[test]
    fn test_huge_chunk_size() {
        let text = "Convexity implies a unique minimum.";
        let chunks = chunk_text("s", text, settings(usize::MAX, 50));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_multibyte_reconstruction() {
        let text = "Градиентный спуск 🎯 сходится при выпуклости. ".repeat(20);
        let chunks = chunk_text("ru.tex", &text, settings(37, 5));

        for c in &chunks {
            assert!(c.text.chars().count() <= 37);
        }
        assert_eq!(reconstruct(&chunks, 5), text);
    }
}
