//! The `Store` trait (C16): the abstract persistence interface the
//! retrieval-augmented core depends on, plus a `SqliteStore` reference
//! adapter (SPEC_FULL.md §6 `Store`).
//!
//! Grounded on the teacher's `storage/traits.rs` (`Storage` trait shape)
//! and `storage/sqlite.rs` (connection setup, `WAL` mode). Every method the
//! core needs is surfaced directly on the trait — per SPEC_FULL.md §9, the
//! re-architecture never downcasts to a concrete backing type.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::core::{Chat, Document, DocumentChunk, Message, ProfileFact, UserProfile};
use crate::error::Result;
use async_trait::async_trait;

/// The persistence collaborator (SPEC_FULL.md §6 `Store`).
///
/// Implementations must serialize writes per key (a single chat's records
/// are never concurrently mutated) while allowing concurrent reads.
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates a new chat record.
    async fn create_chat(&self, chat: &Chat) -> Result<()>;

    /// Fetches a chat by id.
    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>>;

    /// Persists changes to an existing chat (e.g. `file_count` bump).
    async fn update_chat(&self, chat: &Chat) -> Result<()>;

    /// Durably stores a message (user, assistant, or context).
    async fn store_message(&self, message: &Message) -> Result<()>;

    /// Returns every message in a chat, in timestamp order.
    async fn get_all_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Searches only context (Q&A-pair) messages by cosine similarity to
    /// `query_vec`, returning up to `k`, ranked descending with ties broken
    /// by most recent timestamp.
    ///
    /// Used by the turn orchestrator's simple mode (SPEC_FULL.md §4.15): a
    /// chat with no indexed documents still has cross-turn Q&A recall, but
    /// never a document-chunk search. Grounded on SPEC_FULL.md §6's
    /// `search_similar(chat_id, query_vec, k) → messages`, kept as its own
    /// method rather than calling the combined search and discarding the
    /// chunk half, since a chat with zero documents should never pay for a
    /// chunk table scan.
    async fn search_similar(&self, chat_id: &str, query_vec: &[f32], k: usize) -> Result<Vec<Message>>;

    /// Searches context messages and document chunks by cosine similarity
    /// to `query_vec`, returning up to `k` of each, ranked descending with
    /// ties broken by most recent timestamp / highest `chunk_index`.
    async fn search_similar_context_and_chunks(
        &self,
        chat_id: &str,
        query_vec: &[f32],
        k: usize,
    ) -> Result<(Vec<Message>, Vec<DocumentChunk>)>;

    /// Persists document metadata.
    async fn store_document(&self, doc: &Document) -> Result<()>;

    /// Looks up a document by its content hash within a chat, for dedup.
    async fn find_document_by_hash(&self, chat_id: &str, hash: &str) -> Result<Option<Document>>;

    /// Returns every document ingested into a chat.
    async fn get_documents(&self, chat_id: &str) -> Result<Vec<Document>>;

    /// Persists a single document chunk with its embedding.
    async fn store_document_chunk(&self, chunk: &DocumentChunk) -> Result<()>;

    /// Returns every chunk of one document, ordered by `chunk_index`.
    ///
    /// Added per SPEC_FULL.md §9 Open Questions to replace the zero-vector
    /// `k=200` dummy-query workaround the file-mention "retrieve all
    /// chunks" fallback otherwise requires.
    async fn list_chunks_by_document(&self, document_id: &str) -> Result<Vec<DocumentChunk>>;

    /// Returns the accumulated user profile for a chat (empty if none yet).
    async fn get_user_profile(&self, chat_id: &str) -> Result<UserProfile>;

    /// Looks up a single fact by key.
    async fn get_profile_fact(&self, chat_id: &str, key: &str) -> Result<Option<ProfileFact>>;

    /// Inserts or overwrites a fact by key.
    async fn upsert_profile_fact(&self, chat_id: &str, fact: ProfileFact) -> Result<()>;
}
