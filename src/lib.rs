//! # rag-terminal-core
//!
//! The retrieval-augmented conversation core of a local terminal-based chat
//! engine: ingestion, structure-aware chunking, exact similarity retrieval,
//! hierarchical prompt construction, streaming generation, and asynchronous
//! user-profile fact extraction.
//!
//! The terminal UI, command parser, configuration-file loading surface
//! beyond [`config::Config`], and logging sinks are explicit external
//! collaborators — see the [`store::Store`] and [`inference::Inference`]
//! traits, which this crate depends on but does not implement in
//! production (the adapters here are reference/test implementations).
//!
//! ## Modules
//!
//! - [`text`]: encoding detection, cleaning, tokenization, stop words,
//!   language classification, sentence splitting.
//! - [`chunking`]: structure-aware prose and source-code chunkers.
//! - [`paths`]: embedded file-path detection in free-form input.
//! - [`excerpt`]: relevance-scored excerpt extraction.
//! - [`ingest`]: the ingestion orchestrator.
//! - [`retrieval`]: the retriever and code-chunk prioritizer.
//! - [`prompt`]: hierarchical prompt assembly under a token budget.
//! - [`streaming`]: completion-stream collection and Q&A persistence.
//! - [`fact_extraction`]: asynchronous user-profile fact extraction.
//! - [`orchestrator`]: per-turn dispatch.
//! - [`store`] / [`inference`]: the `Store`/`Inference` collaborator traits
//!   plus reference adapters.
//! - [`core`]: the data model (chats, messages, documents, profiles).
//! - [`config`]: configuration loading and token budget profiles.
//! - [`error`]: the crate's error hierarchy.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chunking;
pub mod config;
pub mod core;
pub mod error;
pub mod excerpt;
pub mod fact_extraction;
pub mod inference;
pub mod ingest;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod prompt;
pub mod retrieval;
pub mod store;
pub mod streaming;
pub mod text;

// Re-export the error hierarchy at crate root.
pub use error::{Error, Result};

// Re-export the data model.
pub use core::{Chat, Document, DocumentChunk, Message, ProfileFact, Role, UserProfile};

// Re-export configuration.
pub use config::{Config, TokenBudgetProfile};

// Re-export the external collaborator traits and reference adapters.
pub use inference::{DeterministicInference, Inference, OpenAiInference, cosine_similarity};
pub use store::{SqliteStore, Store};

// Re-export the turn orchestrator's public surface.
pub use orchestrator::{Mode, TurnOutcome, run_turn};

// Re-export ingestion and retrieval entry points.
pub use ingest::{IngestOutcome, ingest_files};
pub use retrieval::{RetrievalResult, retrieve};

// Re-export streaming/cancellation primitives.
pub use streaming::{CancellationHandle, CancellationToken, cancellation_pair, collect_stream, store_completion_pair};
