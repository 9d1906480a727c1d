//! Streaming completion collector (C13): consumes the `Inference` token
//! stream, forwards tokens to the caller's output channel, accumulates the
//! full text, and on completion persists the assistant turn and the
//! re-embedded Q&A pair (chunked if long).
//!
//! Grounded on `dlmanning-tau`'s `tau-ai/src/stream.rs` stream-of-events
//! consumption idiom, combined with the teacher's `async-trait`-based
//! collaborator pattern. Per SPEC_FULL.md §9 REDESIGN FLAGS the upstream
//! `(token_stream, error_channel)` pair collapses into a single
//! `Stream<Item = Result<Token>>`; this collector is what actually drains
//! that stream, so it is the natural home for cooperative cancellation.

use crate::chunking::prose::chunk_prose_with;
use crate::core::{Chat, Message, Role, message::chunked_id};
use crate::error::{Error, Result};
use crate::inference::{Inference, Token, TokenStream};
use crate::io::unicode::find_char_boundary;
use crate::store::Store;
use crate::text::tokens::estimate_tokens;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

/// Q&A pairs at or under this estimated token count are stored as a single
/// context message rather than chunked.
pub const QA_SINGLE_MESSAGE_TOKEN_LIMIT: usize = 300;
/// Prose-chunker target size used when a Q&A pair must be split.
pub const QA_CHUNK_SIZE: usize = 1200;
/// Prose-chunker overlap used when a Q&A pair must be split.
pub const QA_CHUNK_OVERLAP: usize = 50;
/// Hard cap on any single chunked Q&A piece, after the `[Part i/N] ` prefix.
pub const QA_PIECE_MAX_CHARS: usize = 3200;

/// A cooperative cancellation signal shared between a turn's tasks.
///
/// Built on `tokio::sync::watch` rather than a dedicated cancellation crate,
/// matching the rest of the crate's preference for `tokio`'s own sync
/// primitives over bringing in another dependency for one bool.
#[derive(Clone)]
pub struct CancellationToken {
    rx: tokio::sync::watch::Receiver<bool>,
}

/// The write half of a [`CancellationToken`], held by whatever can decide a
/// turn should stop (e.g. the terminal UI on Ctrl-C).
pub struct CancellationHandle {
    tx: tokio::sync::watch::Sender<bool>,
}

/// Builds a linked cancellation handle/token pair, initially not cancelled.
#[must_use]
pub fn cancellation_pair() -> (CancellationHandle, CancellationToken) {
    let (tx, rx) = tokio::sync::watch::channel(false);
    (CancellationHandle { tx }, CancellationToken { rx })
}

impl CancellationHandle {
    /// Signals cancellation to every clone of the paired token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancellationToken {
    /// Returns whether cancellation has already been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled; resolves immediately if it
    /// already has been.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

/// Drains `stream`, forwarding each token to `output` and accumulating the
/// full text. Returns the accumulated text on a clean end-of-stream.
/// Returns [`Error::Cancelled`] if `cancellation` fires or the receiver end
/// of `output` is dropped, and propagates the first stream error as-is.
pub async fn collect_stream(mut stream: TokenStream, output: mpsc::Sender<Token>, cancellation: &CancellationToken) -> Result<String> {
    let mut buffer = String::new();
    loop {
        tokio::select! {
            biased;
            () = cancellation.cancelled() => {
                return Err(Error::Cancelled);
            }
            next = stream.next() => {
                match next {
                    None => break,
                    Some(Err(e)) => return Err(e),
                    Some(Ok(token)) => {
                        buffer.push_str(&token.text);
                        let finished = token.finish_reason.is_some();
                        if output.send(token).await.is_err() {
                            return Err(Error::Cancelled);
                        }
                        if finished {
                            break;
                        }
                    }
                }
            }
        }
    }
    Ok(buffer)
}

/// Persists the completed turn: the assistant's display message, plus the
/// Q&A pair re-embedded for long-term recall (SPEC_FULL.md §4.13).
///
/// Returns the base id used for the context message(s), so the caller can
/// correlate them if needed.
pub async fn store_completion_pair(store: &dyn Store, inference: &dyn Inference, chat: &Chat, user_text: &str, assistant_text: &str) -> Result<String> {
    let assistant_id = uuid::Uuid::new_v4().to_string();
    store
        .store_message(&Message::new(assistant_id, chat.id.clone(), Role::Assistant, assistant_text.to_string()))
        .await?;

    let base_id = uuid::Uuid::new_v4().to_string();
    let qa_text = format!("Previously user asked: {user_text}\nAssistant answered: {assistant_text}");

    if estimate_tokens(&qa_text) <= QA_SINGLE_MESSAGE_TOKEN_LIMIT {
        let embedding = inference.embed(&chat.embedding_model, &qa_text).await?;
        store
            .store_message(&Message::new_context(base_id.clone(), chat.id.clone(), qa_text, embedding))
            .await?;
        return Ok(base_id);
    }

    let pieces = chunk_prose_with(&qa_text, QA_CHUNK_SIZE, QA_CHUNK_OVERLAP);
    let total = pieces.len();
    let prefixed: Vec<String> = pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| truncate_chars(&format!("[Part {}/{total}] {}", i + 1, piece.content), QA_PIECE_MAX_CHARS))
        .collect();

    let embeddings = inference.embed_batch(&chat.embedding_model, &prefixed).await?;
    for (i, (text, embedding)) in prefixed.into_iter().zip(embeddings).enumerate() {
        let id = chunked_id(&base_id, i);
        store.store_message(&Message::new_context(id, chat.id.clone(), text, embedding)).await?;
    }

    Ok(base_id)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let end = find_char_boundary(s, max_chars);
    s[..end].to_string()
}
