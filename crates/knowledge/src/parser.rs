//! Source document discovery and reading.

use crate::types::SourceDocument;
use paperbot_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of scanning the papers directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Eligible files, sorted by file name
    pub paths: Vec<PathBuf>,

    /// Eligible-looking entries that could not be inspected (e.g. dangling
    /// symlinks)
    pub skipped: Vec<PathBuf>,
}

/// List files with `extension` directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing or unreadable directory
/// is an `AppError::Ingest`; a broken entry inside it is logged and, if its
/// name has `extension`, reported in [`Discovery::skipped`].
pub fn discover_documents(dir: &Path, extension: &str) -> AppResult<Discovery> {
    if !dir.is_dir() {
        return Err(AppError::Ingest(format!(
            "Papers directory {:?} does not exist",
            dir
        )));
    }

    let mut discovery = Discovery::default();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(AppError::Ingest(format!("Failed to list {:?}: {}", dir, e)));
            }
            Err(e) => {
                let Some(path) = e.path().map(Path::to_path_buf) else {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                };
                if has_extension(&path, extension) {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    discovery.skipped.push(path);
                } else {
                    tracing::debug!("Ignoring broken entry {:?}: {}", path, e);
                }
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            discovery.paths.push(entry.into_path());
        }
    }

    tracing::debug!(
        "Found {} .{} files in {:?} ({} broken)",
        discovery.paths.len(),
        extension,
        dir,
        discovery.skipped.len()
    );
    Ok(discovery)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == extension)
}

/// Read a document as UTF-8.
///
/// Unreadable files and invalid UTF-8 are `AppError::Ingest`.
pub fn read_document(path: &Path) -> AppResult<SourceDocument> {
    let bytes =
        fs::read(path).map_err(|e| AppError::Ingest(format!("Failed to read {:?}: {}", path, e)))?;

    let content_hash = hex_digest(&bytes);

    let content = String::from_utf8(bytes)
        .map_err(|e| AppError::Ingest(format!("{:?} is not valid UTF-8: {}", path, e)))?;

    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    Ok(SourceDocument {
        id,
        path: path.to_path_buf(),
        content,
        content_hash,
    })
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
