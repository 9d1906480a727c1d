//! The `Inference` trait (C16): the abstract remote-model collaborator the
//! retrieval-augmented core depends on, plus reference adapters.
//!
//! Grounded on the teacher's `embedding::Embedder` trait shape and
//! `cosine_similarity` (reused here for query/chunk ranking), combined with
//! `dlmanning-tau`'s `tau-ai/src/stream.rs` streaming shape. Per SPEC_FULL.md
//! §9 REDESIGN FLAGS, the two-channel `(token_stream, error_channel)` wire
//! shape collapses into a single `Stream<Item = Result<Token>>` — a stream
//! that yields its own errors needs no sibling channel for the caller to
//! poll separately, and it composes with `tokio_stream`/`futures_util`
//! combinators the way the rest of the crate already does.

pub mod deterministic;
pub mod openai;

pub use deterministic::DeterministicInference;
pub use openai::OpenAiInference;

use crate::error::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// One token's worth of streamed chat-completion output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Text delta for this token. May be empty (matches the upstream SSE
    /// payload's `delta.content`, which is sometimes empty on role-only
    /// chunks).
    pub text: String,
    /// Set on the final token of the stream, carrying the upstream
    /// `finish_reason`.
    pub finish_reason: Option<String>,
}

/// A single chat message passed to a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

/// A chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model name (`Chat::model`).
    pub model: String,
    /// Ordered messages, system prompt first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum output tokens.
    pub max_tokens: usize,
}

/// A stream of streamed completion tokens.
pub type TokenStream = BoxStream<'static, Result<Token>>;

/// The inference collaborator (SPEC_FULL.md §6 `Inference`): embeddings,
/// streaming and non-streaming chat completion, and optional reranking.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Generates an embedding for a single text using `model`.
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts in one request where the
    /// backend supports batching.
    ///
    /// The default implementation issues one [`Inference::embed`] call per
    /// text; adapters capable of true batch embedding should override it.
    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(model, text).await?);
        }
        Ok(embeddings)
    }

    /// Streams a chat completion token-by-token.
    async fn chat_completion_stream(&self, request: CompletionRequest) -> Result<TokenStream>;

    /// Runs a chat completion and returns the full text at once.
    async fn chat_completion_sync(&self, request: CompletionRequest) -> Result<String>;

    /// Scores `documents` against `query` for reranking, returning one score
    /// per document in the same order. `None` means the adapter does not
    /// support reranking and callers should fall back to the LLM
    /// JSON-scoring protocol (SPEC_FULL.md §4.10).
    async fn rerank(&self, _model: &str, _query: &str, _documents: &[String]) -> Result<Option<Vec<f64>>> {
        Ok(None)
    }
}

/// Computes cosine similarity between two embedding vectors, returning `0.0`
/// for mismatched lengths or zero-magnitude vectors rather than panicking.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}
