//! Turn orchestrator (C15): dispatches each user turn to ingestion or to
//! simple/RAG generation, following the per-turn sequence of SPEC_FULL.md
//! §4.15 end to end.
//!
//! Authored fresh from SPEC_FULL.md §4.15 and §9's redesign note: the
//! original "base orchestrator with back-references to simple/RAG
//! specializations" collapses into a single function parameterized by a
//! tagged [`Mode`], with [`crate::streaming::store_completion_pair`] as the
//! shared Q&A persistence helper both modes call identically.

use crate::config::Config;
use crate::core::{Chat, Message, Role};
use crate::error::Result;
use crate::fact_extraction::spawn_fact_extraction;
use crate::ingest::{IngestOutcome, ingest_files};
use crate::inference::{ChatMessage, CompletionRequest, Inference, Token};
use crate::paths::detect_paths;
use crate::prompt::{build_prompt, select_budgets};
use crate::retrieval::{RetrievalResult, retrieve};
use crate::store::Store;
use crate::streaming::{CancellationToken, collect_stream, store_completion_pair};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Bounded capacity of the per-turn token output channel (SPEC_FULL.md §5):
/// this is the crate's sole backpressure mechanism on the inference stream.
pub const OUTPUT_CHANNEL_CAPACITY: usize = 10;

/// How many most-recent raw (user/assistant) turns are offered to the
/// prompt builder's history section, ahead of any Q&A recall surfaced by
/// retrieval. Not part of SPEC_FULL.md's token budgeting (the history
/// section's char budget is what actually bounds what is emitted); this
/// just bounds how much gets handed to the budgeter in the first place.
const RECENT_HISTORY_TURNS: usize = 20;

/// Dispatch tag selecting simple vs. retrieval-augmented generation
/// (SPEC_FULL.md §4.15). Replaces the teacher's mutually-referencing
/// "base orchestrator + specialization" pattern per §9 REDESIGN FLAGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No documents indexed yet: generation runs without chunk search or
    /// document-aware prompt sections, but cross-turn Q&A recall over prior
    /// context messages (if any) still applies.
    Simple,
    /// At least one document has been ingested: full retrieval, code-chunk
    /// prioritization, and the document-list/excerpts prompt sections all
    /// apply.
    Retrieval,
}

impl Mode {
    /// Selects [`Mode::Retrieval`] iff the chat has any ingested documents
    /// (SPEC_FULL.md §4.15: `chat.file_count > 0 ? RAG mode : simple mode`).
    #[must_use]
    pub const fn for_chat(chat: &Chat) -> Self {
        if chat.has_documents() {
            Self::Retrieval
        } else {
            Self::Simple
        }
    }
}

/// What happened during one call to [`run_turn`].
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The turn ingested one or more detected file paths rather than
    /// generating a reply (SPEC_FULL.md §2 control flow: path detection
    /// takes priority over retrieval/generation for that turn).
    Ingested {
        /// Per-file outcomes, in input order.
        outcomes: Vec<IngestOutcome>,
    },
    /// The turn generated and persisted an assistant reply.
    Generated {
        /// Dispatch mode the turn ran under.
        mode: Mode,
        /// The full assistant reply text.
        assistant_text: String,
    },
}

/// Runs one user turn to completion: stores the user message, detects
/// embedded file paths (ingesting if any are found), otherwise retrieves
/// context, builds a prompt, streams the completion to `output`, and
/// persists + schedules fact extraction on completion.
///
/// Tokens are forwarded to `output` in arrival order as they stream; per
/// SPEC_FULL.md §5 the channel's bounded capacity ([`OUTPUT_CHANNEL_CAPACITY`])
/// is the turn's only backpressure point, and dropping a token is never
/// correct — callers must keep receiving until the channel closes.
///
/// The user message is durably stored before this function does anything
/// else, satisfying SPEC_FULL.md §5's ordering guarantee independent of
/// whether the rest of the turn later fails or is cancelled.
pub async fn run_turn(
    store: &Arc<dyn Store>,
    inference: &Arc<dyn Inference>,
    config: &Config,
    chat: &mut Chat,
    user_text: &str,
    output: mpsc::Sender<Token>,
    cancellation: &CancellationToken,
) -> Result<TurnOutcome> {
    let user_id = uuid::Uuid::new_v4().to_string();
    store.store_message(&Message::new(user_id, chat.id.clone(), Role::User, user_text.to_string())).await?;

    let (detected_paths, residual_query) = detect_paths(user_text, |p| std::path::Path::new(p).exists());

    if !detected_paths.is_empty() {
        let files: Vec<PathBuf> = detected_paths.into_iter().map(|p| PathBuf::from(p.path)).collect();
        let (progress_tx, _progress_rx) = mpsc::channel(16);
        let outcomes = ingest_files(store.as_ref(), inference.as_ref(), &chat.id, &chat.embedding_model, &files, &progress_tx).await?;

        let newly_ingested = outcomes.iter().filter(|o| matches!(o, IngestOutcome::Ingested { .. })).count();
        if newly_ingested > 0 {
            chat.file_count += newly_ingested;
            store.update_chat(chat).await?;
        }

        return Ok(TurnOutcome::Ingested { outcomes });
    }

    let query = if residual_query.is_empty() { user_text.trim() } else { residual_query.trim() };
    let mode = Mode::for_chat(chat);

    let (retrieval, documents) = match mode {
        Mode::Retrieval => {
            let documents = store.get_documents(&chat.id).await?;
            let retrieval = retrieve(chat, store.as_ref(), inference.as_ref(), &documents, query).await?;
            (retrieval, documents)
        }
        Mode::Simple => {
            let query_vec = inference.embed(&chat.embedding_model, query).await?;
            let messages = store.search_similar(&chat.id, &query_vec, chat.top_k).await?;
            (RetrievalResult { messages, chunks: Vec::new() }, Vec::new())
        }
    };

    if cancellation.is_cancelled() {
        return Err(crate::error::Error::Cancelled);
    }

    let profile = store.get_user_profile(&chat.id).await?;
    let budgets = select_budgets(config, chat.context_window, &retrieval.chunks);
    let history = recent_history(store.as_ref(), &chat.id, user_text, &retrieval.messages).await?;

    let prompt_body = build_prompt(&budgets, &profile, &documents, &retrieval.chunks, query, &history, user_text);

    let mut messages = Vec::with_capacity(2);
    if !chat.system_prompt.is_empty() {
        messages.push(ChatMessage { role: "system", content: chat.system_prompt.clone() });
    }
    messages.push(ChatMessage { role: "user", content: prompt_body });

    let request = CompletionRequest {
        model: chat.model.clone(),
        messages,
        temperature: chat.temperature,
        max_tokens: chat.max_tokens,
    };

    let stream = inference.chat_completion_stream(request).await?;
    let assistant_text = collect_stream(stream, output, cancellation).await?;

    store_completion_pair(store.as_ref(), inference.as_ref(), chat, user_text, &assistant_text).await?;

    spawn_fact_extraction(Arc::clone(store), Arc::clone(inference), chat.clone(), user_text.to_string(), assistant_text.clone());

    Ok(TurnOutcome::Generated { mode, assistant_text })
}

/// Builds the history section's candidate messages: up to
/// [`RECENT_HISTORY_TURNS`] of the chat's actual prior user/assistant turns,
/// followed by any Q&A-pair context messages the retriever surfaced (cross-
/// turn recall relevant to this specific query). [`build_prompt`] filters
/// out whichever of these equals `current_user_message` verbatim and caps
/// the whole section by its char budget.
async fn recent_history(store: &dyn Store, chat_id: &str, current_user_message: &str, retrieved_context: &[Message]) -> Result<Vec<Message>> {
    let all = store.get_all_messages(chat_id).await?;
    let mut recent: Vec<Message> = all
        .into_iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant) && m.content != current_user_message)
        .collect();
    if recent.len() > RECENT_HISTORY_TURNS {
        let drop = recent.len() - RECENT_HISTORY_TURNS;
        recent.drain(0..drop);
    }
    recent.extend(retrieved_context.iter().cloned());
    Ok(recent)
}
