//! The [`Message`] entity covering user turns, assistant turns, and the
//! embedded Q&A-pair "context" messages used for cross-turn recall.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role a message plays in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message authored by the end user.
    User,
    /// A message authored by the assistant, stored for display.
    Assistant,
    /// A Q&A-pair summary stored with an embedding for retrieval.
    Context,
}

impl Role {
    /// The lowercase label used in prompts and storage (`"user"`,
    /// `"assistant"`, `"context"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Context => "context",
        }
    }
}

/// A single stored message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Opaque identifier. Chunked context messages use `<base>-chunk-<n>`.
    pub id: String,
    /// Owning chat.
    pub chat_id: String,
    /// Role this message plays.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Embedding vector. Present only for `Role::Context` messages.
    pub embedding: Option<Vec<f32>>,
}

impl Message {
    /// Builds a new message with no embedding.
    #[must_use]
    pub fn new(id: impl Into<String>, chat_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            embedding: None,
        }
    }

    /// Builds a new context message carrying an embedding.
    #[must_use]
    pub fn new_context(id: impl Into<String>, chat_id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            role: Role::Context,
            content: content.into(),
            timestamp: Utc::now(),
            embedding: Some(embedding),
        }
    }

    /// Returns the base message id with any `-chunk-<n>` suffix stripped.
    #[must_use]
    pub fn base_id(&self) -> &str {
        base_id(&self.id)
    }

    /// Returns the chunk index if this message's id carries a
    /// `-chunk-<n>` suffix.
    #[must_use]
    pub fn chunk_index(&self) -> Option<usize> {
        chunk_index(&self.id)
    }
}

/// Strips a trailing `-chunk-<n>` suffix from a message id, returning the
/// base id shared by all chunks of the same Q&A pair.
#[must_use]
pub fn base_id(id: &str) -> &str {
    id.find("-chunk-").map_or(id, |pos| &id[..pos])
}

/// Parses the `<n>` suffix of a `-chunk-<n>` message id, if present.
#[must_use]
pub fn chunk_index(id: &str) -> Option<usize> {
    let pos = id.find("-chunk-")?;
    id[pos + "-chunk-".len()..].parse().ok()
}

/// Builds the chunked message id `<base>-chunk-<n>`.
#[must_use]
pub fn chunked_id(base: &str, n: usize) -> String {
    format!("{base}-chunk-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_id_strips_chunk_suffix() {
        assert_eq!(base_id("msg-42-chunk-3"), "msg-42");
        assert_eq!(base_id("msg-42"), "msg-42");
    }

    #[test]
    fn test_chunk_index_parses_suffix() {
        assert_eq!(chunk_index("msg-42-chunk-3"), Some(3));
        assert_eq!(chunk_index("msg-42"), None);
    }

    #[test]
    fn test_chunked_id_round_trips() {
        let id = chunked_id("msg-42", 5);
        assert_eq!(id, "msg-42-chunk-5");
        assert_eq!(base_id(&id), "msg-42");
        assert_eq!(chunk_index(&id), Some(5));
    }

    #[test]
    fn test_new_message_has_no_embedding() {
        let msg = Message::new("m1", "chat-1", Role::User, "hello");
        assert!(msg.embedding.is_none());
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn test_new_context_message_carries_embedding() {
        let msg = Message::new_context("m1-chunk-0", "chat-1", "summary", vec![0.1, 0.2]);
        assert_eq!(msg.role, Role::Context);
        assert_eq!(msg.embedding.as_deref(), Some([0.1, 0.2].as_slice()));
        assert_eq!(msg.base_id(), "m1");
        assert_eq!(msg.chunk_index(), Some(0));
    }
}
