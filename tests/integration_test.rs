//! Integration tests for the retrieval-augmented conversation core,
//! exercising ingestion, retrieval, and full-turn orchestration end to end
//! against the in-memory `SqliteStore` and the deterministic `Inference`
//! test double (SPEC_FULL.md §8 testable properties and scenarios).

#![allow(clippy::expect_used)]

use rag_terminal_core::config::Config;
use rag_terminal_core::core::{Chat, Role};
use rag_terminal_core::inference::DeterministicInference;
use rag_terminal_core::ingest::{IngestOutcome, ingest_files};
use rag_terminal_core::orchestrator::{Mode, TurnOutcome, run_turn};
use rag_terminal_core::store::{SqliteStore, Store};
use rag_terminal_core::streaming::cancellation_pair;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(content.as_bytes()).expect("write");
    path
}

async fn new_chat(store: &Arc<dyn Store>, id: &str) -> Chat {
    let chat = Chat::new(id, "Test Chat");
    store.create_chat(&chat).await.expect("create chat");
    chat
}

/// Scenario 1 (SPEC_FULL.md §8): a file with a unique token buried in a
/// middle paragraph ingests into multiple chunks, and a query mentioning
/// that token retrieves a chunk whose content contains it.
#[tokio::test]
async fn test_ingest_then_retrieve_finds_unique_token() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().expect("store"));
    let inference = DeterministicInference::new(8, "unused");
    let chat = new_chat(&store, "chat-1").await;

    let filler = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(30);
    let content = format!("{filler}The salamander lives quietly near the pond, unnoticed by most. {filler}");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "wildlife.txt", &content);

    let (tx, _rx) = mpsc::channel(16);
    let outcomes = ingest_files(store.as_ref(), &inference, "chat-1", "embed-model", &[path], &tx).await.expect("ingest");
    let chunk_count = match &outcomes[0] {
        IngestOutcome::Ingested { chunk_count, .. } => *chunk_count,
        other => panic!("expected ingestion, got {other:?}"),
    };
    assert!(chunk_count >= 3, "expected at least 3 chunks, got {chunk_count}");

    let documents = store.get_documents("chat-1").await.expect("documents");
    let query_vec = inference.embed("embed-model", "where is the salamander?").await.expect("embed");
    let (_messages, chunks) = store.search_similar_context_and_chunks("chat-1", &query_vec, 5).await.expect("search");
    assert_eq!(documents.len(), 1);
    assert!(chunks.iter().any(|c| c.content.contains("salamander")));
}

/// Scenario 3: ingesting the same file twice leaves exactly one stored
/// document and reports the duplicate without an error.
#[tokio::test]
async fn test_duplicate_ingest_leaves_one_document() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().expect("store"));
    let inference = DeterministicInference::new(8, "unused");
    let _chat = new_chat(&store, "chat-1").await;

    let dir = tempfile::tempdir().expect("tempdir");
    let a = write_file(&dir, "a.txt", "identical file contents for dedup");
    let b = write_file(&dir, "b.txt", "identical file contents for dedup");

    let (tx, _rx) = mpsc::channel(16);
    let outcomes = ingest_files(store.as_ref(), &inference, "chat-1", "embed-model", &[a, b], &tx).await.expect("ingest");

    assert!(matches!(outcomes[0], IngestOutcome::Ingested { .. }));
    assert!(matches!(outcomes[1], IngestOutcome::Duplicate { .. }));

    let documents = store.get_documents("chat-1").await.expect("documents");
    assert_eq!(documents.len(), 1);
}

/// Scenario 5: a Go source file with three top-level `func` declarations
/// chunks into at least three pieces, each containing `func `.
#[tokio::test]
async fn test_go_source_chunks_by_function() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().expect("store"));
    let inference = DeterministicInference::new(8, "unused");
    let _chat = new_chat(&store, "chat-1").await;

    let source = r#"
package main

func add(a, b int) int {
    return a + b
}

func subtract(a, b int) int {
    return a - b
}

func main() {
    result := add(2, subtract(5, 3))
    println(result)
}
"#;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "math.go", source);

    let (tx, _rx) = mpsc::channel(16);
    let outcomes = ingest_files(store.as_ref(), &inference, "chat-1", "embed-model", &[path], &tx).await.expect("ingest");
    let chunk_count = match &outcomes[0] {
        IngestOutcome::Ingested { chunk_count, .. } => *chunk_count,
        other => panic!("expected ingestion, got {other:?}"),
    };
    assert!(chunk_count >= 3, "expected at least 3 chunks, got {chunk_count}");

    let documents = store.get_documents("chat-1").await.expect("documents");
    let all_chunks = store.list_chunks_by_document(&documents[0].id).await.expect("chunks");
    let func_chunks = all_chunks.iter().filter(|c| c.content.contains("func ")).count();
    assert!(func_chunks >= 3, "expected at least 3 chunks containing 'func ', got {func_chunks}");
}

/// A chat with no ingested documents dispatches to simple mode, generates a
/// reply, and persists the assistant turn plus a re-embedded Q&A context
/// message — but never touches document chunk search.
#[tokio::test]
async fn test_simple_mode_full_turn_round_trip() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().expect("store"));
    let inference: Arc<dyn rag_terminal_core::inference::Inference> = Arc::new(DeterministicInference::new(8, "The answer is 42."));
    let config = Config::default();
    let mut chat = new_chat(&store, "chat-1").await;

    let (tx, mut rx) = mpsc::channel(10);
    let (_handle, cancellation) = cancellation_pair();
    let drain = tokio::spawn(async move {
        let mut text = String::new();
        while let Some(token) = rx.recv().await {
            text.push_str(&token.text);
        }
        text
    });

    let outcome = run_turn(&store, &inference, &config, &mut chat, "what is the answer?", tx, &cancellation).await.expect("turn");
    let forwarded = drain.await.expect("drain");

    let TurnOutcome::Generated { mode, assistant_text } = outcome else {
        panic!("expected a generated reply");
    };
    assert_eq!(mode, Mode::Simple);
    assert_eq!(assistant_text, "The answer is 42.");
    assert_eq!(forwarded, "The answer is 42.");

    let messages = store.get_all_messages("chat-1").await.expect("messages");
    assert_eq!(messages.iter().filter(|m| m.role == Role::User).count(), 1);
    assert_eq!(messages.iter().filter(|m| m.role == Role::Assistant).count(), 1);
    assert_eq!(messages.iter().filter(|m| m.role == Role::Context).count(), 1);
}

/// With documents ingested, a turn dispatches to retrieval mode and the
/// user's file-path mention triggers ingestion on a later turn rather than
/// generation (control flow ordering from SPEC_FULL.md §2).
#[tokio::test]
async fn test_turn_with_file_path_ingests_and_bumps_file_count() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().expect("store"));
    let inference: Arc<dyn rag_terminal_core::inference::Inference> = Arc::new(DeterministicInference::new(8, "unused"));
    let config = Config::default();
    let mut chat = new_chat(&store, "chat-1").await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "doc.txt", "Some useful background material about salamanders.");

    let (tx, rx) = mpsc::channel(10);
    drop(rx);
    let (_handle, cancellation) = cancellation_pair();

    let user_text = format!("please index {}", path.display());
    let outcome = run_turn(&store, &inference, &config, &mut chat, &user_text, tx, &cancellation).await.expect("turn");

    assert!(matches!(outcome, TurnOutcome::Ingested { .. }));
    assert_eq!(chat.file_count, 1);

    let stored_chat = store.get_chat("chat-1").await.expect("get").expect("present");
    assert_eq!(stored_chat.file_count, 1);
}

/// Config validation rejects a malformed token budget profile (SPEC_FULL.md
/// §4.1 validation rule: `excerpts + history <= 1`).
#[test]
fn test_invalid_token_budget_config_is_rejected() {
    use rag_terminal_core::config::TokenBudgetProfile;
    let profile = TokenBudgetProfile {
        input_ratio: 0.7,
        excerpts: 0.8,
        history: 0.5,
    };
    assert!(profile.validate().is_err());
}

mod property_tests {
    use proptest::prelude::*;
    use rag_terminal_core::chunking::chunk_prose;
    use rag_terminal_core::text::clean_text;

    proptest! {
        /// Prose chunker termination (SPEC_FULL.md §8): for any non-empty
        /// text, chunking returns a non-empty list and start positions
        /// strictly advance.
        #[test]
        fn prose_chunker_terminates_and_advances(content in "[a-zA-Z0-9 .\n]{1,3000}") {
            if content.trim().is_empty() {
                return Ok(());
            }
            let chunks = chunk_prose(&content);
            prop_assert!(!chunks.is_empty());
            for window in chunks.windows(2) {
                prop_assert!(window[1].start_pos > window[0].start_pos);
            }
        }

        /// Cleaning is idempotent: `clean(clean(s)) == clean(s)`.
        #[test]
        fn clean_text_is_idempotent(content in "[\\x20-\\x7E\n\t]{0,500}") {
            let once = clean_text(&content);
            let twice = clean_text(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
