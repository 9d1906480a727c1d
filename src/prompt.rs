//! Prompt builder (C12): assembles the hierarchical prompt — user profile,
//! available documents, excerpted relevant information, conversation
//! history, then the literal user query — each section capped by its
//! token-derived character budget.
//!
//! Authored fresh from SPEC_FULL.md §4.12, drawing the excerpt and budget
//! primitives from [`crate::excerpt`] and [`crate::text::tokens`].

use crate::config::Config;
use crate::core::{Document, DocumentChunk, Message, UserProfile};
use crate::excerpt::{excerpt_code, excerpt_prose, excerpt_sql};
use crate::text::tokens::{Budgets, partition_budget};

const PROFILE_MIN_CONFIDENCE: f64 = 0.6;
const MAX_EXCERPT_CHARS: usize = 500;
const MIN_EXCERPT_REMAINING: usize = 50;
const HISTORY_TRUNCATE_MARGIN: usize = 20;

/// Picks the prose or code token budget profile based on whether any
/// candidate chunk belongs to a source file, per SPEC_FULL.md §4.1's
/// `is_code` selector.
#[must_use]
pub fn select_budgets(config: &Config, context_window: usize, chunks: &[DocumentChunk]) -> Budgets {
    let is_code = chunks.iter().any(|c| crate::chunking::is_code_file(std::path::Path::new(&c.file_path)));
    let profile = if is_code { &config.code_token_budget } else { &config.token_budget };
    partition_budget(profile, context_window)
}

/// Builds the full prompt text for one turn.
///
/// `current_user_message` is excluded from the history section if it
/// duplicates a context message's content (the retriever may surface the
/// turn's own just-stored Q&A pair).
#[must_use]
pub fn build_prompt(
    budgets: &Budgets,
    profile: &UserProfile,
    documents: &[Document],
    chunks: &[DocumentChunk],
    query: &str,
    history: &[Message],
    current_user_message: &str,
) -> String {
    let mut prompt = String::new();

    append_profile_section(&mut prompt, profile);
    append_document_list(&mut prompt, documents, budgets.file_list_chars);
    append_excerpts(&mut prompt, chunks, query, budgets.excerpts_chars);
    append_history(&mut prompt, history, current_user_message, budgets.history_chars);

    prompt.push_str("\nAnswer the user's question using the context above when relevant.\n\n");
    prompt.push_str("User: ");
    prompt.push_str(query);
    prompt.push('\n');

    prompt
}

fn append_profile_section(prompt: &mut String, profile: &UserProfile) {
    let grouped = profile.grouped_by_category(PROFILE_MIN_CONFIDENCE);
    if grouped.is_empty() {
        return;
    }
    prompt.push_str("## User Profile\n");
    for (category, facts) in grouped {
        let heading = titlecase(&category);
        prompt.push_str(&format!("### {heading}\n"));
        for fact in facts {
            prompt.push_str(&format!("- {}: {}\n", fact.key, fact.value));
        }
    }
    prompt.push('\n');
}

fn titlecase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn append_document_list(prompt: &mut String, documents: &[Document], budget: usize) {
    if documents.is_empty() {
        return;
    }
    let mut section = String::from("## Available Documents\n");
    for (i, doc) in documents.iter().enumerate() {
        let line = format!("{}. {} ({} chunks)\n", i + 1, doc.file_name, doc.chunk_count);
        if section.len() + line.len() > budget.max(section.len()) && section.len() > "## Available Documents\n".len() {
            break;
        }
        section.push_str(&line);
    }
    section.push('\n');
    prompt.push_str(&section);
}

fn append_excerpts(prompt: &mut String, chunks: &[DocumentChunk], query: &str, budget: usize) {
    if chunks.is_empty() || budget < MIN_EXCERPT_REMAINING {
        return;
    }
    let mut section = String::from("## Relevant Information\n");
    let mut remaining = budget;

    for chunk in chunks {
        if remaining < MIN_EXCERPT_REMAINING {
            break;
        }
        let cap = remaining.min(MAX_EXCERPT_CHARS);
        let excerpt = excerpt_for(chunk, query, cap);
        let line = format!("[{}] {excerpt}\n", chunk.file_path);
        if line.len() > remaining {
            break;
        }
        remaining -= line.len();
        section.push_str(&line);
    }

    if section.len() > "## Relevant Information\n".len() {
        section.push('\n');
        prompt.push_str(&section);
    }
}

fn excerpt_for(chunk: &DocumentChunk, query: &str, cap: usize) -> String {
    let path = std::path::Path::new(&chunk.file_path);
    if !crate::chunking::is_code_file(path) {
        return excerpt_prose(&chunk.content, query, cap);
    }
    if path.extension().and_then(|e| e.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("sql")) {
        excerpt_sql(&chunk.content, query, cap)
    } else {
        excerpt_code(&chunk.content, query, cap)
    }
}

fn append_history(prompt: &mut String, history: &[Message], current_user_message: &str, budget: usize) {
    let filtered: Vec<&Message> = history.iter().filter(|m| m.content != current_user_message).collect();
    if filtered.is_empty() || budget == 0 {
        return;
    }
    let mut section = String::from("## Previous Conversation History\n");
    let per_message_cap = budget.saturating_sub(HISTORY_TRUNCATE_MARGIN);
    let mut remaining = budget;

    for message in filtered {
        if remaining < HISTORY_TRUNCATE_MARGIN {
            break;
        }
        let (content, truncated) = if message.content.len() > per_message_cap {
            (truncate_chars(&message.content, per_message_cap), true)
        } else {
            (message.content.clone(), false)
        };
        let content = if truncated { format!("{content}…") } else { content };
        let line = format!("[{}]: {content}\n", message.role.label());
        if line.len() > remaining {
            break;
        }
        remaining -= line.len();
        section.push_str(&line);
    }

    if section.len() > "## Previous Conversation History\n".len() {
        section.push('\n');
        prompt.push_str(&section);
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let end = crate::io::unicode::find_char_boundary(s, max_chars);
    s[..end].to_string()
}
