//! Retriever (C10): embeds the user's turn, searches persisted context and
//! document chunks, reassembles chunked Q&A messages, applies file-mention
//! overrides, and optionally reranks via the LLM.
//!
//! Authored fresh from SPEC_FULL.md §4.10, built on the teacher's
//! `search::hybrid_search` shape (embed query once, rank everything by
//! cosine similarity) generalized to the two result kinds this crate
//! persists (context messages and document chunks) and extended with the
//! chunk-reassembly and file-mention steps the teacher has no equivalent of.

use crate::core::{Chat, Document, DocumentChunk, Message};
use crate::error::{Error, InferenceError, Result, TextError};
use crate::inference::{ChatMessage, CompletionRequest, Inference};
use crate::retrieval::prioritize::prioritize_code_chunks;
use crate::store::Store;

/// The candidates assembled for one turn, ready for prompt construction.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    /// Context (Q&A-pair) messages, reassembled across any chunk splits.
    pub messages: Vec<Message>,
    /// Document chunks, after file-mention filtering and/or prioritization.
    pub chunks: Vec<DocumentChunk>,
}

/// Runs the full retrieval pipeline for one user turn.
pub async fn retrieve(
    chat: &Chat,
    store: &dyn Store,
    inference: &dyn Inference,
    documents: &[Document],
    user_text: &str,
) -> Result<RetrievalResult> {
    let query_vec = inference.embed(&chat.embedding_model, user_text).await?;

    let retrieval_k = if chat.use_reranking { chat.top_k * 2 } else { chat.top_k };
    let (raw_messages, mut chunks) = store.search_similar_context_and_chunks(&chat.id, &query_vec, retrieval_k).await?;

    let mut messages = if raw_messages.iter().any(|m| m.chunk_index().is_some()) {
        let all_messages = store.get_all_messages(&chat.id).await?;
        reassemble_context_messages(&raw_messages, &all_messages)
    } else {
        raw_messages
    };

    let mentioned = detect_file_mentions(documents, user_text);
    if !mentioned.is_empty() {
        let mentioned_paths: std::collections::HashSet<&str> = mentioned.iter().map(|d| d.file_path.as_str()).collect();
        let filtered: Vec<DocumentChunk> = chunks.iter().filter(|c| mentioned_paths.contains(c.file_path.as_str())).cloned().collect();

        chunks = if filtered.is_empty() {
            let mut all_mentioned_chunks = Vec::new();
            for doc in &mentioned {
                all_mentioned_chunks.extend(store.list_chunks_by_document(&doc.id).await?);
            }
            all_mentioned_chunks.sort_by_key(|c| (c.document_id.clone(), c.chunk_index));
            all_mentioned_chunks
        } else {
            filtered
        };

        let is_code = mentioned.iter().any(|d| crate::chunking::is_code_file(std::path::Path::new(&d.file_path)));
        if is_code {
            let all_doc_chunks: Vec<DocumentChunk> = {
                let mut all = Vec::new();
                for doc in &mentioned {
                    all.extend(store.list_chunks_by_document(&doc.id).await?);
                }
                all
            };
            chunks = prioritize_code_chunks(&chunks, &all_doc_chunks, chat.top_k);
        } else {
            chunks.truncate(chat.top_k / 2);
        }
    }

    if chat.use_reranking && !messages.is_empty() {
        messages = rerank_messages(inference, chat, user_text, messages).await;
    }

    Ok(RetrievalResult { messages, chunks })
}

/// Regroups any message whose id carries a `-chunk-<n>` suffix by fetching
/// every sibling chunk from `all_messages`, stripping `[Part i/N] ` prefixes,
/// concatenating in order, and replacing the whole group with one message.
fn reassemble_context_messages(candidates: &[Message], all_messages: &[Message]) -> Vec<Message> {
    let mut seen_bases = std::collections::HashSet::new();
    let mut result = Vec::new();

    for candidate in candidates {
        let base = candidate.base_id().to_string();
        if candidate.chunk_index().is_none() {
            result.push(candidate.clone());
            continue;
        }
        if !seen_bases.insert(base.clone()) {
            continue;
        }
        let mut siblings: Vec<&Message> = all_messages.iter().filter(|m| m.base_id() == base).collect();
        siblings.sort_by_key(|m| m.chunk_index().unwrap_or(0));
        let merged_content = siblings.iter().map(|m| strip_part_prefix(&m.content)).collect::<Vec<_>>().join(" ");
        let template = siblings.first().copied().unwrap_or(candidate);
        result.push(Message {
            id: base,
            content: merged_content,
            ..template.clone()
        });
    }

    result
}

fn strip_part_prefix(content: &str) -> &str {
    if let Some(rest) = content.strip_prefix('[') {
        if let Some(close) = rest.find("] ") {
            let marker = &rest[..close];
            if marker.starts_with("Part ") {
                return &rest[close + 2..];
            }
        }
    }
    content
}

/// Finds documents whose base file name or full path appears (case
/// insensitively) as a substring of `user_text`.
fn detect_file_mentions<'a>(documents: &'a [Document], user_text: &str) -> Vec<&'a Document> {
    let lower = user_text.to_lowercase();
    documents
        .iter()
        .filter(|d| lower.contains(&d.file_name.to_lowercase()) || lower.contains(&d.file_path.to_lowercase()))
        .collect()
}

/// Calls the LLM JSON-scoring reranking protocol (SPEC_FULL.md §4.10) and
/// keeps the top `top_k/2` messages. Falls back to the original similarity
/// order, truncated to `top_k`, if the reranker call or parse fails.
async fn rerank_messages(inference: &dyn Inference, chat: &Chat, query: &str, messages: Vec<Message>) -> Vec<Message> {
    let prompt = build_rerank_prompt(query, &messages);
    let request = CompletionRequest {
        model: chat.model.clone(),
        messages: vec![ChatMessage { role: "user", content: prompt }],
        temperature: 0.1,
        max_tokens: 256,
    };

    match inference.chat_completion_sync(request).await {
        Ok(text) => match parse_rerank_scores(&text, messages.len()) {
            Ok(scores) => {
                let mut scored: Vec<(f64, Message)> = messages.into_iter().zip(scores).map(|(m, s)| (s, m)).collect();
                scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
                let keep = (chat.top_k / 2).max(1);
                scored.into_iter().take(keep).map(|(_, m)| m).collect()
            }
            Err(_) => {
                let mut messages = messages;
                messages.truncate(chat.top_k);
                messages
            }
        },
        Err(_) => {
            let mut messages = messages;
            messages.truncate(chat.top_k);
            messages
        }
    }
}

fn build_rerank_prompt(query: &str, messages: &[Message]) -> String {
    let mut prompt = format!(
        "Score how relevant each numbered message is to the query on a scale of 0 to 10.\n\
         Respond with ONLY a JSON array of {} numbers, nothing else.\n\nQuery: {query}\n\n",
        messages.len()
    );
    for (i, message) in messages.iter().enumerate() {
        prompt.push_str(&format!("{}. [{}]: {}\n", i + 1, message.role.label(), message.content));
    }
    prompt
}

/// Parses the reranker's response into exactly `expected_len` scores,
/// stripping a surrounding markdown code fence if present.
fn parse_rerank_scores(text: &str, expected_len: usize) -> Result<Vec<f64>> {
    let stripped = strip_markdown_fences(text.trim());
    let scores: Vec<f64> = serde_json::from_str(stripped).map_err(|e| Error::Text(TextError::Parse(e.to_string())))?;
    if scores.len() != expected_len {
        return Err(Error::Inference(InferenceError::InvalidResponse(format!(
            "reranker returned {} scores, expected {expected_len}",
            scores.len()
        ))));
    }
    Ok(scores)
}

pub(crate) fn strip_markdown_fences(text: &str) -> &str {
    let text = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")).unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;

    fn msg(id: &str, content: &str) -> Message {
        Message::new_context(id, "chat-1", content, vec![0.1])
    }

    #[test]
    fn test_reassemble_merges_chunked_messages_in_order() {
        let candidates = vec![msg("base-1-chunk-1", "[Part 2/2] world")];
        let all = vec![msg("base-1-chunk-0", "[Part 1/2] hello"), msg("base-1-chunk-1", "[Part 2/2] world")];
        let result = reassemble_context_messages(&candidates, &all);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "base-1");
        assert_eq!(result[0].content, "hello world");
    }

    #[test]
    fn test_reassemble_leaves_unchunked_messages_alone() {
        let candidates = vec![msg("plain-1", "no chunks here")];
        let result = reassemble_context_messages(&candidates, &candidates);
        assert_eq!(result[0].id, "plain-1");
    }

    #[test]
    fn test_detect_file_mentions_matches_file_name_case_insensitively() {
        let docs = vec![Document::new("d1", "chat-1", "/home/user/Report.TXT", "text/plain", 1, "UTF-8", "h1")];
        let mentions = detect_file_mentions(&docs, "please summarize report.txt for me");
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn test_detect_file_mentions_empty_when_no_match() {
        let docs = vec![Document::new("d1", "chat-1", "/home/user/Report.TXT", "text/plain", 1, "UTF-8", "h1")];
        assert!(detect_file_mentions(&docs, "what is the weather").is_empty());
    }

    #[test]
    fn test_parse_rerank_scores_strips_markdown_fence() {
        let scores = parse_rerank_scores("```json\n[1.0, 2.0, 3.0]\n```", 3).expect("parse");
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_rerank_scores_length_mismatch_is_error() {
        assert!(parse_rerank_scores("[1.0, 2.0]", 3).is_err());
    }

    #[test]
    fn test_build_rerank_prompt_numbers_messages() {
        let messages = vec![Message::new("m1", "chat-1", Role::User, "hi there")];
        let prompt = build_rerank_prompt("q", &messages);
        assert!(prompt.contains("1. [user]: hi there"));
    }
}
