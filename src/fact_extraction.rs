//! Profile fact extractor (C14): fires after a turn's Q&A pair is persisted,
//! asks the LLM for structured facts about the user, and conflict-resolves
//! them into the chat's profile.
//!
//! Authored fresh from SPEC_FULL.md §4.14. The fire-and-forget scheduling
//! (delay, deadline, logged-not-surfaced failures) follows the teacher's
//! `tracing`-first error handling; the conflict resolution itself is
//! [`crate::core::profile::UserProfile::merge`].

use crate::core::profile::FactSource;
use crate::core::{Chat, ProfileFact, UserProfile};
use crate::error::Result;
use crate::inference::{ChatMessage, CompletionRequest, Inference};
use crate::retrieval::retriever::strip_markdown_fences;
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Delay before the extraction pass starts, so it never contends with the
/// turn's own completion.
pub const EXTRACTION_DELAY: Duration = Duration::from_secs(2);
/// Hard deadline for the whole extraction pass, independent of turn
/// cancellation.
pub const EXTRACTION_DEADLINE: Duration = Duration::from_secs(30);
/// Facts below this confidence are discarded.
pub const MIN_FACT_CONFIDENCE: f64 = 0.6;

#[derive(Debug, serde::Deserialize)]
struct ExtractedFact {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

/// Spawns the fire-and-forget extraction task for one completed turn.
///
/// Waits [`EXTRACTION_DELAY`], then runs the extraction under
/// [`EXTRACTION_DEADLINE`]. Any failure (inference error, parse error,
/// timeout) is logged via `tracing` and never surfaced to the turn, per
/// SPEC_FULL.md §4.14.
pub fn spawn_fact_extraction(store: Arc<dyn Store>, inference: Arc<dyn Inference>, chat: Chat, user_text: String, assistant_text: String) {
    tokio::spawn(async move {
        tokio::time::sleep(EXTRACTION_DELAY).await;
        let outcome = tokio::time::timeout(EXTRACTION_DEADLINE, extract_and_store(store.as_ref(), inference.as_ref(), &chat, &user_text, &assistant_text)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::warn!(chat_id = %chat.id, %error, "profile fact extraction failed"),
            Err(_) => tracing::warn!(chat_id = %chat.id, "profile fact extraction timed out"),
        }
    });
}

/// Runs one extraction pass synchronously: prompts the LLM, parses the
/// response, and merges every accepted fact into the chat's stored profile.
pub async fn extract_and_store(store: &dyn Store, inference: &dyn Inference, chat: &Chat, user_text: &str, assistant_text: &str) -> Result<()> {
    let prompt = build_extraction_prompt(user_text, assistant_text);
    let request = CompletionRequest {
        model: chat.model.clone(),
        messages: vec![ChatMessage { role: "user", content: prompt }],
        temperature: 0.0,
        max_tokens: 1000,
    };
    let response = inference.chat_completion_sync(request).await?;
    let now = Utc::now();

    for incoming in parse_extracted_facts(&response, now) {
        let existing = store.get_profile_fact(&chat.id, &incoming.key).await?;
        let merged = merge_fact(existing, incoming, now);
        store.upsert_profile_fact(&chat.id, merged).await?;
    }
    Ok(())
}

fn build_extraction_prompt(user_text: &str, assistant_text: &str) -> String {
    format!(
        "Extract any durable facts about the user from this exchange.\n\
         Respond with ONLY a JSON array of objects with fields category, key, value, \
         confidence (0 to 1), source (\"explicit\" or \"inferred\"), and context.\n\
         If there are no facts worth recording, respond with [].\n\n\
         User: {user_text}\n\
         Assistant: {assistant_text}\n"
    )
}

/// Parses the extractor's response, discarding facts with a missing `key`
/// or `value` or `confidence < `[`MIN_FACT_CONFIDENCE`].
fn parse_extracted_facts(text: &str, now: DateTime<Utc>) -> Vec<ProfileFact> {
    let stripped = strip_markdown_fences(text.trim());
    let raw: Vec<ExtractedFact> = serde_json::from_str(stripped).unwrap_or_default();

    raw.into_iter()
        .filter_map(|f| {
            let key = f.key.filter(|k| !k.is_empty())?;
            let value = f.value.filter(|v| !v.is_empty())?;
            let confidence = f.confidence.unwrap_or(0.0);
            if confidence < MIN_FACT_CONFIDENCE {
                return None;
            }
            let full_key = match f.category.filter(|c| !c.is_empty()) {
                Some(category) => format!("{category}:{key}"),
                None => key,
            };
            let source = if f.source.as_deref() == Some("explicit") { FactSource::Explicit } else { FactSource::Inferred };
            Some(ProfileFact {
                key: full_key,
                value,
                confidence,
                source,
                context: f.context.unwrap_or_default(),
                first_seen: now,
                last_seen: now,
            })
        })
        .collect()
}

/// Resolves `incoming` against `existing` (if any) via
/// [`UserProfile::merge`] and returns the fact that should be persisted.
fn merge_fact(existing: Option<ProfileFact>, incoming: ProfileFact, now: DateTime<Utc>) -> ProfileFact {
    let key = incoming.key.clone();
    let fallback = incoming.clone();
    let mut profile = UserProfile::new(String::new());
    if let Some(existing) = existing {
        profile.facts.insert(existing.key.clone(), existing);
    }
    profile.merge(incoming, now);
    profile.facts.remove(&key).unwrap_or(fallback)
}
