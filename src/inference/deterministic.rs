//! A deterministic [`Inference`] adapter for tests: hash-based pseudo
//! embeddings and canned completions, with no network access.
//!
//! Grounded on the teacher's `embedding::fallback::FallbackEmbedder`
//! (hash-based deterministic embedding, used there as the no-feature-flag
//! default).

use crate::error::Result;
use crate::inference::{ChatMessage, CompletionRequest, Inference, Token, TokenStream};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_stream::StreamExt;

/// Deterministic, network-free [`Inference`] implementation.
///
/// Embeddings are derived from a simple rolling hash of the input text so
/// that identical text always produces identical vectors and similar
/// prefixes produce correlated vectors, without depending on any model.
pub struct DeterministicInference {
    dimensions: usize,
    /// Fixed text returned by [`Inference::chat_completion_sync`] and
    /// streamed token-by-token by [`Inference::chat_completion_stream`],
    /// unless overridden per call via [`DeterministicInference::with_reply`].
    reply: String,
    call_count: AtomicUsize,
}

impl DeterministicInference {
    /// Builds an adapter producing `dimensions`-length embeddings and
    /// echoing a fixed `reply` for completions.
    #[must_use]
    pub fn new(dimensions: usize, reply: impl Into<String>) -> Self {
        Self {
            dimensions,
            reply: reply.into(),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Number of completion calls made so far (stream + sync combined).
    pub fn completion_calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn hash_embedding(&self, text: &str) -> Vec<f32> {
        let mut state = 0xcbf2_9ce4_8422_2325u64;
        let mut out = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            state ^= u64::from(byte);
            state = state.wrapping_mul(0x0000_0100_0000_01B3);
            let idx = i % self.dimensions;
            out[idx] += ((state >> 32) as i32 as f32) / i32::MAX as f32;
        }
        out
    }
}

#[async_trait]
impl Inference for DeterministicInference {
    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
        Ok(self.hash_embedding(text))
    }

    async fn chat_completion_stream(&self, _request: CompletionRequest) -> Result<TokenStream> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let words: Vec<String> = self.reply.split(' ').map(ToString::to_string).collect();
        let len = words.len();
        let tokens: Vec<Result<Token>> = words
            .into_iter()
            .enumerate()
            .map(|(i, w)| {
                let text = if i + 1 == len { w } else { format!("{w} ") };
                Ok(Token {
                    text,
                    finish_reason: if i + 1 == len { Some("stop".to_string()) } else { None },
                })
            })
            .collect();
        Ok(Box::pin(tokio_stream::iter(tokens)))
    }

    async fn chat_completion_sync(&self, _request: CompletionRequest) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Builds a minimal single-user-message request, convenient for tests.
#[must_use]
pub fn simple_request(model: &str, user_text: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage { role: "user", content: user_text.to_string() }],
        temperature: 0.7,
        max_tokens: 512,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_is_deterministic() {
        let inference = DeterministicInference::new(8, "hi");
        let a = inference.embed("model", "hello world").await.expect("embed");
        let b = inference.embed("model", "hello world").await.expect("embed");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn test_different_text_yields_different_embedding() {
        let inference = DeterministicInference::new(8, "hi");
        let a = inference.embed("model", "hello").await.expect("embed");
        let b = inference.embed("model", "goodbye").await.expect("embed");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_chat_completion_sync_returns_reply() {
        let inference = DeterministicInference::new(4, "the answer is 42");
        let text = inference.chat_completion_sync(simple_request("m", "q")).await.expect("completion");
        assert_eq!(text, "the answer is 42");
        assert_eq!(inference.completion_calls(), 1);
    }

    #[tokio::test]
    async fn test_chat_completion_stream_reassembles_to_reply() {
        let inference = DeterministicInference::new(4, "the answer is 42");
        let mut stream = inference.chat_completion_stream(simple_request("m", "q")).await.expect("stream");
        let mut full = String::new();
        let mut saw_finish = false;
        while let Some(token) = stream.next().await {
            let token = token.expect("token");
            full.push_str(&token.text);
            if token.finish_reason.is_some() {
                saw_finish = true;
            }
        }
        assert_eq!(full, "the answer is 42");
        assert!(saw_finish);
    }

    #[tokio::test]
    async fn test_default_rerank_returns_none() {
        let inference = DeterministicInference::new(4, "x");
        let result = inference.rerank("m", "q", &["a".to_string()]).await.expect("rerank");
        assert!(result.is_none());
    }
}
