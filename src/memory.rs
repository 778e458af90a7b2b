//! Read-only view over the memory notes directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::health::format_bytes;
use crate::models::MemoryFile;

const NOTE_EXTENSION: &str = ".md";
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct MemoryReader {
    dir: PathBuf,
}

impl MemoryReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All `.md` notes, most recently modified first.
    ///
    /// Any failure reading the directory or one of its notes fails the
    /// whole listing. Subdirectories are ignored.
    pub async fn list(&self) -> Result<Vec<MemoryFile>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(NOTE_EXTENSION) {
                continue;
            }

            let path = entry.path();
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            // Notes are not guaranteed to be UTF-8; invalid bytes become U+FFFD.
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            let content = String::from_utf8_lossy(&bytes);
            let modified: DateTime<Utc> = metadata
                .modified()
                .map_err(|e| StoreError::io(&path, e))?
                .into();

            files.push(MemoryFile {
                name,
                size: format_bytes(metadata.len()),
                modified,
                preview: preview(&content),
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }

    /// Listing for the dashboard: a read failure renders as no notes.
    pub async fn list_or_empty(&self) -> Vec<MemoryFile> {
        self.list().await.unwrap_or_else(|e| {
            tracing::warn!("Memory listing failed: {}", e);
            Vec::new()
        })
    }
}

/// First 200 characters with `#` heading markers removed.
pub fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    head.replace('#', "").trim().to_string()
}
