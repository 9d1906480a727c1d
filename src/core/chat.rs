//! The [`Chat`] entity: a single conversation's identity and tuning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single conversation, its model configuration, and retrieval tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    /// Opaque identifier, unique across the store.
    pub id: String,
    /// Display name shown to the user.
    pub name: String,
    /// System prompt prepended ahead of the built context on every turn.
    pub system_prompt: String,
    /// Chat-completion model name passed to `Inference`.
    pub model: String,
    /// Embedding model name passed to `Inference`.
    pub embedding_model: String,
    /// Number of candidate chunks/messages requested per retrieval.
    pub top_k: usize,
    /// Whether the retriever invokes the LLM reranking pass.
    pub use_reranking: bool,
    /// Sampling temperature passed to chat completion.
    pub temperature: f64,
    /// Maximum output tokens requested per turn.
    pub max_tokens: usize,
    /// Total context window (input + output) of `model`.
    pub context_window: usize,
    /// Count of documents successfully ingested into this chat.
    pub file_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Builds a new chat with sensible defaults for everything but identity.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: String::new(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            top_k: 8,
            use_reranking: false,
            temperature: 0.7,
            max_tokens: 1024,
            context_window: 128_000,
            file_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the chat has indexed documents, i.e. dispatches to RAG mode
    /// rather than simple mode.
    #[must_use]
    pub const fn has_documents(&self) -> bool {
        self.file_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_has_no_documents() {
        let chat = Chat::new("chat-1", "Test Chat");
        assert!(!chat.has_documents());
        assert_eq!(chat.top_k, 8);
    }

    #[test]
    fn test_file_count_flips_mode() {
        let mut chat = Chat::new("chat-1", "Test Chat");
        chat.file_count = 1;
        assert!(chat.has_documents());
    }
}
