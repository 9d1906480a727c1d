//! Ingestion orchestrator (C9): for each file, parse, chunk, hash, dedup,
//! persist metadata, batch-embed, persist chunks. Emits progress markers on
//! a caller channel.
//!
//! Authored fresh from SPEC_FULL.md §4.9, following the teacher's
//! channel-based progress reporting shape and `tracing`-logged per-item
//! failure handling (continue past a single bad file rather than abort).

use crate::chunking::{chunk_code, chunk_prose, is_code_file};
use crate::core::{Document, DocumentChunk};
use crate::error::Result;
use crate::inference::Inference;
use crate::store::Store;
use crate::text::clean::{clean_text, content_hash};
use crate::text::encoding::{check_extensionless_whitelist, decode};
use std::path::Path;
use tokio::sync::mpsc;

/// Outcome of ingesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Document stored with this many chunks.
    Ingested {
        /// Stored document id.
        document_id: String,
        /// Number of chunks persisted.
        chunk_count: usize,
    },
    /// Skipped: duplicate of an already-stored document (dedup invariant).
    Duplicate {
        /// The id of the document already stored under the same content hash.
        existing_document_id: String,
    },
    /// Skipped: the file could not be parsed (read failure or unsupported
    /// extensionless file).
    Skipped {
        /// Why the file was skipped.
        reason: String,
    },
}

/// Ingests every path in `files` into `chat_id`, reporting `@@PROGRESS:n/total@@`
/// markers and duplicate notices on `progress` as each file completes.
///
/// Per-file read/parse failures are reported via [`IngestOutcome::Skipped`]
/// and do not stop the batch. A `store` or `inference` failure aborts the
/// whole ingest and is propagated to the caller.
pub async fn ingest_files(store: &dyn Store, inference: &dyn Inference, chat_id: &str, embedding_model: &str, files: &[std::path::PathBuf], progress: &mpsc::Sender<String>) -> Result<Vec<IngestOutcome>> {
    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, path) in files.iter().enumerate() {
        let outcome = ingest_one(store, inference, chat_id, embedding_model, path).await?;

        match &outcome {
            IngestOutcome::Skipped { reason } => {
                tracing::warn!(path = %path.display(), reason, "skipped file during ingestion");
            }
            IngestOutcome::Duplicate { existing_document_id } => {
                let file_name = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                let _ = progress.send(format!("Skipped {file_name} (duplicate of {existing_document_id})")).await;
            }
            IngestOutcome::Ingested { .. } => {}
        }

        outcomes.push(outcome);
        let _ = progress.send(format!("@@PROGRESS:{}/{total}@@", i + 1)).await;
    }

    Ok(outcomes)
}

async fn ingest_one(store: &dyn Store, inference: &dyn Inference, chat_id: &str, embedding_model: &str, path: &Path) -> Result<IngestOutcome> {
    if let Err(e) = check_extensionless_whitelist(path) {
        return Ok(IngestOutcome::Skipped { reason: e.to_string() });
    }

    let raw = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return Ok(IngestOutcome::Skipped { reason: e.to_string() }),
    };

    let (decoded, encoding) = decode(&raw);
    let cleaned = clean_text(&decoded);

    let pieces: Vec<(String, usize, usize)> = if is_code_file(path) {
        chunk_code(&cleaned).into_iter().map(|c| (c.content, c.start_pos, c.end_pos)).collect()
    } else {
        chunk_prose(&cleaned).into_iter().map(|c| (c.content, c.start_pos, c.end_pos)).collect()
    };

    if pieces.is_empty() {
        return Ok(IngestOutcome::Skipped { reason: "no content after cleaning".to_string() });
    }

    let hash = content_hash(&raw);
    if let Some(existing) = store.find_document_by_hash(chat_id, &hash).await? {
        return Ok(IngestOutcome::Duplicate { existing_document_id: existing.id });
    }

    let document_id = uuid::Uuid::new_v4().to_string();
    let mut document = Document::new(document_id.clone(), chat_id, path.display().to_string(), guess_mime_type(path), raw.len() as u64, encoding.name(), hash);
    document.chunk_count = pieces.len();
    store.store_document(&document).await?;

    let texts: Vec<String> = pieces.iter().map(|(content, ..)| content.clone()).collect();
    let embeddings = inference.embed_batch(embedding_model, &texts).await?;

    for (i, ((content, start_pos, end_pos), embedding)) in pieces.into_iter().zip(embeddings).enumerate() {
        let chunk = DocumentChunk {
            id: format!("{document_id}-chunk-{i}"),
            document_id: document_id.clone(),
            chat_id: chat_id.to_string(),
            chunk_index: i,
            content,
            start_pos,
            end_pos,
            file_path: document.file_path.clone(),
            embedding,
        };
        store.store_document_chunk(&chunk).await?;
    }

    Ok(IngestOutcome::Ingested { document_id, chunk_count: document.chunk_count })
}

fn guess_mime_type(path: &Path) -> String {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "md" | "markdown" => "text/markdown",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "html" | "htm" => "text/html",
        "rs" => "text/x-rust",
        "py" => "text/x-python",
        "js" | "jsx" => "text/javascript",
        "ts" | "tsx" => "text/typescript",
        "go" => "text/x-go",
        "java" => "text/x-java",
        "c" | "h" | "cpp" => "text/x-c",
        "cs" => "text/x-csharp",
        "sql" => "application/sql",
        "sh" | "bash" => "text/x-shellscript",
        _ => "text/plain",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Chat;
    use crate::inference::DeterministicInference;
    use crate::store::SqliteStore;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        path
    }

    #[tokio::test]
    async fn test_ingest_single_file_persists_document_and_chunks() {
        let store = SqliteStore::in_memory().expect("store");
        let chat = Chat::new("chat-1", "Test");
        store.create_chat(&chat).await.expect("create chat");
        let inference = DeterministicInference::new(4, "unused");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "notes.txt", "The salamander lives near the pond. It is small and orange.");

        let (tx, _rx) = mpsc::channel(16);
        let outcomes = ingest_files(&store, &inference, "chat-1", "embed-model", &[path], &tx).await.expect("ingest");

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(&outcomes[0], IngestOutcome::Ingested { chunk_count, .. } if *chunk_count == 1));

        let docs = store.get_documents("chat-1").await.expect("documents");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].chunk_count, 1);
    }

    #[tokio::test]
    async fn test_ingest_duplicate_content_is_skipped_without_error() {
        let store = SqliteStore::in_memory().expect("store");
        let chat = Chat::new("chat-1", "Test");
        store.create_chat(&chat).await.expect("create chat");
        let inference = DeterministicInference::new(4, "unused");

        let dir = tempfile::tempdir().expect("tempdir");
        let a = write_temp(&dir, "a.txt", "identical content here");
        let b = write_temp(&dir, "b.txt", "identical content here");

        let (tx, _rx) = mpsc::channel(16);
        let outcomes = ingest_files(&store, &inference, "chat-1", "embed-model", &[a, b], &tx).await.expect("ingest");

        assert!(matches!(outcomes[0], IngestOutcome::Ingested { .. }));
        assert!(matches!(&outcomes[1], IngestOutcome::Duplicate { .. }));

        let docs = store.get_documents("chat-1").await.expect("documents");
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_code_file_chunks_via_code_chunker() {
        let store = SqliteStore::in_memory().expect("store");
        let chat = Chat::new("chat-1", "Test");
        store.create_chat(&chat).await.expect("create chat");
        let inference = DeterministicInference::new(4, "unused");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "main.rs", "fn main() {\n    println!(\"hi\");\n}\n");

        let (tx, _rx) = mpsc::channel(16);
        let outcomes = ingest_files(&store, &inference, "chat-1", "embed-model", &[path], &tx).await.expect("ingest");
        assert!(matches!(outcomes[0], IngestOutcome::Ingested { .. }));
    }

    #[tokio::test]
    async fn test_ingest_missing_file_is_skipped_not_aborted() {
        let store = SqliteStore::in_memory().expect("store");
        let chat = Chat::new("chat-1", "Test");
        store.create_chat(&chat).await.expect("create chat");
        let inference = DeterministicInference::new(4, "unused");

        let (tx, _rx) = mpsc::channel(16);
        let missing = std::path::PathBuf::from("/nonexistent/path/does-not-exist.txt");
        let outcomes = ingest_files(&store, &inference, "chat-1", "embed-model", &[missing], &tx).await.expect("ingest");
        assert!(matches!(&outcomes[0], IngestOutcome::Skipped { .. }));
    }
}
