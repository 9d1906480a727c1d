//! Core domain models for the retrieval-augmented conversation core.
//!
//! These are pure data structures with no I/O dependencies: chats, messages,
//! documents and their chunks, and the per-chat user profile.

pub mod chat;
pub mod document;
pub mod message;
pub mod profile;

pub use chat::Chat;
pub use document::{Document, DocumentChunk};
pub use message::{Message, Role};
pub use profile::{ProfileFact, UserProfile};
