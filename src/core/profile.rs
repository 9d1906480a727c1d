//! The [`UserProfile`] and [`ProfileFact`] entities populated by the
//! asynchronous fact extractor (C14).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a fact originated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FactSource {
    /// The user stated this directly.
    Explicit,
    /// The model inferred this from context.
    Inferred,
}

/// A single durable fact about the user of a chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileFact {
    /// Unique key within the chat, conventionally `category:name`.
    pub key: String,
    /// Current value.
    pub value: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// How the fact was obtained.
    pub source: FactSource,
    /// Free-form excerpt of the turn this fact came from.
    pub context: String,
    /// When this key was first recorded.
    pub first_seen: DateTime<Utc>,
    /// When this key was last confirmed or updated.
    pub last_seen: DateTime<Utc>,
}

impl ProfileFact {
    /// The recency decay weight applied during conflict resolution:
    /// `max(0.5, 0.9 ^ weeks_since_last_seen)`.
    #[must_use]
    pub fn recency(&self, now: DateTime<Utc>) -> f64 {
        let weeks = (now - self.last_seen).num_seconds().max(0) as f64 / (7.0 * 86_400.0);
        0.9f64.powf(weeks).max(0.5)
    }

    /// Conflict score used to decide which of two facts sharing a key wins:
    /// `confidence * recency`.
    #[must_use]
    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        self.confidence * self.recency(now)
    }

    /// The fact's category, i.e. the prefix of `key` before the first `:`.
    #[must_use]
    pub fn category(&self) -> &str {
        self.key.split(':').next().unwrap_or(&self.key)
    }
}

/// The accumulated set of facts known about the user of one chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Owning chat.
    pub chat_id: String,
    /// Facts keyed by `ProfileFact::key`.
    pub facts: HashMap<String, ProfileFact>,
}

impl UserProfile {
    /// Builds an empty profile for a chat.
    #[must_use]
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            facts: HashMap::new(),
        }
    }

    /// Returns facts with confidence at least `min_confidence`, grouped by
    /// category in the fixed display order `identity, professional,
    /// preference, project, personal`, with any remaining categories
    /// appended alphabetically.
    #[must_use]
    pub fn grouped_by_category(&self, min_confidence: f64) -> Vec<(String, Vec<&ProfileFact>)> {
        const ORDER: [&str; 5] = ["identity", "professional", "preference", "project", "personal"];
        let mut by_category: HashMap<&str, Vec<&ProfileFact>> = HashMap::new();
        for fact in self.facts.values() {
            if fact.confidence >= min_confidence {
                by_category.entry(fact.category()).or_default().push(fact);
            }
        }
        let mut result = Vec::new();
        for &cat in &ORDER {
            if let Some(mut facts) = by_category.remove(cat) {
                facts.sort_by(|a, b| a.key.cmp(&b.key));
                result.push((cat.to_string(), facts));
            }
        }
        let mut remaining: Vec<_> = by_category.into_iter().collect();
        remaining.sort_by(|a, b| a.0.cmp(b.0));
        for (cat, mut facts) in remaining {
            facts.sort_by(|a, b| a.key.cmp(&b.key));
            result.push((cat.to_string(), facts));
        }
        result
    }

    /// Merges a newly extracted fact into the profile, resolving conflicts
    /// by recency-decayed confidence score (spec §4.14 / SPEC_FULL.md §4.14).
    ///
    /// Returns `true` if the stored value changed.
    pub fn merge(&mut self, incoming: ProfileFact, now: DateTime<Utc>) -> bool {
        match self.facts.get_mut(&incoming.key) {
            None => {
                self.facts.insert(incoming.key.clone(), incoming);
                true
            }
            Some(existing) if existing.value == incoming.value => {
                existing.last_seen = now;
                existing.confidence = (existing.confidence + 0.05).min(1.0);
                false
            }
            Some(existing) => {
                let existing_score = existing.score(now);
                let new_score = incoming.confidence;
                if new_score > existing_score {
                    let first_seen = existing.first_seen;
                    *existing = incoming;
                    existing.first_seen = first_seen;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fact(key: &str, value: &str, confidence: f64, last_seen: DateTime<Utc>) -> ProfileFact {
        ProfileFact {
            key: key.to_string(),
            value: value.to_string(),
            confidence,
            source: FactSource::Inferred,
            context: String::new(),
            first_seen: last_seen,
            last_seen,
        }
    }

    #[test]
    fn test_recency_decays_with_age_but_floors_at_half() {
        let now = Utc::now();
        let f = fact("k", "v", 0.9, now - Duration::weeks(8));
        let recency = f.recency(now);
        assert!((recency - 0.5).abs() < 1e-9, "expected floor of 0.5, got {recency}");
    }

    #[test]
    fn test_merge_inserts_new_fact() {
        let mut profile = UserProfile::new("chat-1");
        let changed = profile.merge(fact("professional:role", "engineer", 0.9, Utc::now()), Utc::now());
        assert!(changed);
        assert_eq!(profile.facts.len(), 1);
    }

    #[test]
    fn test_merge_same_value_bumps_confidence_and_last_seen() {
        let mut profile = UserProfile::new("chat-1");
        let old_ts = Utc::now() - Duration::weeks(2);
        profile.merge(fact("professional:role", "engineer", 0.8, old_ts), Utc::now());
        let now = Utc::now();
        let changed = profile.merge(fact("professional:role", "engineer", 0.8, now), now);
        assert!(!changed);
        let stored = &profile.facts["professional:role"];
        assert!((stored.confidence - 0.85).abs() < 1e-9);
        assert_eq!(stored.last_seen, now);
    }

    #[test]
    fn test_merge_conflicting_value_new_wins_when_higher_score() {
        // Mirrors SPEC_FULL.md §8 scenario 4: existing 0.9 confidence decayed
        // over 8 weeks (~0.45 score) loses to a fresh 0.8-confidence fact.
        let mut profile = UserProfile::new("chat-1");
        let eight_weeks_ago = Utc::now() - Duration::weeks(8);
        profile.merge(fact("professional:role", "engineer", 0.9, eight_weeks_ago), eight_weeks_ago);
        let now = Utc::now();
        let changed = profile.merge(fact("professional:role", "architect", 0.8, now), now);
        assert!(changed);
        assert_eq!(profile.facts["professional:role"].value, "architect");
    }

    #[test]
    fn test_merge_conflicting_value_existing_wins_when_higher_score() {
        let mut profile = UserProfile::new("chat-1");
        let now = Utc::now();
        profile.merge(fact("professional:role", "engineer", 0.95, now), now);
        let changed = profile.merge(fact("professional:role", "architect", 0.3, now), now);
        assert!(!changed);
        assert_eq!(profile.facts["professional:role"].value, "engineer");
    }

    #[test]
    fn test_grouped_by_category_orders_fixed_then_alpha() {
        let mut profile = UserProfile::new("chat-1");
        let now = Utc::now();
        profile.merge(fact("personal:pet", "cat", 0.9, now), now);
        profile.merge(fact("identity:name", "Alex", 0.9, now), now);
        profile.merge(fact("zzz:other", "thing", 0.9, now), now);
        let grouped = profile.grouped_by_category(0.6);
        let categories: Vec<_> = grouped.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(categories, vec!["identity", "personal", "zzz"]);
    }

    #[test]
    fn test_grouped_by_category_filters_low_confidence() {
        let mut profile = UserProfile::new("chat-1");
        let now = Utc::now();
        profile.merge(fact("identity:name", "Alex", 0.4, now), now);
        let grouped = profile.grouped_by_category(0.6);
        assert!(grouped.is_empty());
    }
}
