//! The [`Document`] and [`DocumentChunk`] entities produced by ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ingested file's metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Opaque identifier.
    pub id: String,
    /// Owning chat.
    pub chat_id: String,
    /// Absolute path as provided at ingestion time.
    pub file_path: String,
    /// File name component of `file_path`.
    pub file_name: String,
    /// Best-guess MIME type (e.g. `text/plain`, `text/x-rust`).
    pub mime_type: String,
    /// Size of the raw file in bytes.
    pub file_size: u64,
    /// Detected text encoding (e.g. `UTF-8`, `Windows-1251`).
    pub encoding: String,
    /// Hex-encoded SHA-256 of the raw file bytes, used for dedup.
    pub content_hash: String,
    /// Number of chunks produced for this document.
    pub chunk_count: usize,
    /// Ingestion timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Free-form metadata (e.g. detected language, line count).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Builds document metadata for a freshly ingested file.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        chat_id: impl Into<String>,
        file_path: impl Into<String>,
        mime_type: impl Into<String>,
        file_size: u64,
        encoding: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        let file_path = file_path.into();
        let file_name = std::path::Path::new(&file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            file_path,
            file_name,
            mime_type: mime_type.into(),
            file_size,
            encoding: encoding.into(),
            content_hash: content_hash.into(),
            chunk_count: 0,
            uploaded_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

/// A chunk of an ingested document, carrying its own embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Opaque identifier.
    pub id: String,
    /// Owning document.
    pub document_id: String,
    /// Owning chat, denormalized for single-table similarity search.
    pub chat_id: String,
    /// Zero-based, dense position within the document.
    pub chunk_index: usize,
    /// Chunk text.
    pub content: String,
    /// Byte offset of the chunk's start within the cleaned document text.
    pub start_pos: usize,
    /// Byte offset of the chunk's end (exclusive).
    pub end_pos: usize,
    /// Convenience copy of the owning document's `file_path`.
    pub file_path: String,
    /// Embedding vector; length equals the chat's configured dimensions.
    pub embedding: Vec<f32>,
}
