//! Code chunk prioritizer (C11): budgets candidate chunks of a single code
//! file toward headers first, then similarity order, then neighbors of
//! whatever was already picked.
//!
//! Authored fresh from SPEC_FULL.md §4.11; grounded in the retriever's own
//! ranking conventions (ascending `chunk_index` as the final presentation
//! order, matching how C9 persists chunks in document order).

use crate::core::DocumentChunk;

/// Keyword set identifying a "header" chunk: a definition, declaration, or
/// entry point worth keeping regardless of similarity rank.
const HEADER_KEYWORDS: [&str; 12] = [
    "CREATE PROCEDURE",
    "AS BEGIN",
    "FUNC ",
    "DEF ",
    "CLASS ",
    "IMPL ",
    "NAMESPACE ",
    "@",
    "RETURNS",
    "ИДЕНТИФИКАТОР",
    "ПАРАМЕТР",
    "РАСЧЕТ",
];

const MAX_HEADERS: usize = 3;
const NEIGHBOR_RADIUS: usize = 2;

fn is_header_chunk(chunk: &DocumentChunk) -> bool {
    if chunk.chunk_index > 2 {
        return false;
    }
    let upper = chunk.content.to_uppercase();
    HEADER_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

/// Prioritizes `candidates` (already ranked by similarity, most relevant
/// first) down to `budget` chunks: header chunks first (up to 3), then
/// similarity-ranked non-header chunks, then neighbors (within 2 chunk
/// indices of anything already picked) closest first. Final order is
/// ascending `chunk_index`.
#[must_use]
pub fn prioritize_code_chunks(candidates: &[DocumentChunk], all_chunks: &[DocumentChunk], budget: usize) -> Vec<DocumentChunk> {
    if budget == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut selected: Vec<DocumentChunk> = Vec::new();
    let mut selected_ids = std::collections::HashSet::new();

    for chunk in candidates {
        if selected.len() >= MAX_HEADERS {
            break;
        }
        if is_header_chunk(chunk) && selected_ids.insert(chunk.id.clone()) {
            selected.push(chunk.clone());
        }
    }

    for chunk in candidates {
        if selected.len() >= budget {
            break;
        }
        if selected_ids.insert(chunk.id.clone()) {
            selected.push(chunk.clone());
        }
    }

    if selected.len() < budget {
        let selected_indices: Vec<usize> = selected.iter().map(|c| c.chunk_index).collect();
        let mut neighbors: Vec<(usize, &DocumentChunk)> = all_chunks
            .iter()
            .filter(|c| !selected_ids.contains(&c.id))
            .filter_map(|c| {
                selected_indices
                    .iter()
                    .map(|&si| si.abs_diff(c.chunk_index))
                    .filter(|&d| d <= NEIGHBOR_RADIUS)
                    .min()
                    .map(|d| (d, c))
            })
            .collect();
        neighbors.sort_by_key(|(d, c)| (*d, c.chunk_index));

        for (_, chunk) in neighbors {
            if selected.len() >= budget {
                break;
            }
            if selected_ids.insert(chunk.id.clone()) {
                selected.push(chunk.clone());
            }
        }
    }

    selected.sort_by_key(|c| c.chunk_index);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, index: usize, content: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            chat_id: "chat-1".to_string(),
            chunk_index: index,
            content: content.to_string(),
            start_pos: 0,
            end_pos: content.len(),
            file_path: "/tmp/a.go".to_string(),
            embedding: vec![0.1],
        }
    }

    #[test]
    fn test_header_chunks_always_selected_first() {
        let candidates = vec![
            chunk("c5", 5, "some body code"),
            chunk("c0", 0, "func Handler() { return 1 }"),
        ];
        let all = candidates.clone();
        let result = prioritize_code_chunks(&candidates, &all, 2);
        assert_eq!(result[0].id, "c0");
    }

    #[test]
    fn test_budget_caps_result_size() {
        let candidates: Vec<_> = (0..10).map(|i| chunk(&format!("c{i}"), i, "body")).collect();
        let all = candidates.clone();
        let result = prioritize_code_chunks(&candidates, &all, 3);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_neighbors_fill_remaining_slots() {
        let candidates = vec![chunk("c10", 10, "func target() {}")];
        let all: Vec<_> = (8..=12).map(|i| chunk(&format!("c{i}"), i, "body")).collect();
        let result = prioritize_code_chunks(&candidates, &all, 3);
        assert_eq!(result.len(), 3);
        assert!(result.iter().any(|c| c.id == "c10"));
        let indices: Vec<usize> = result.iter().map(|c| c.chunk_index).collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_candidates_yields_empty() {
        assert!(prioritize_code_chunks(&[], &[], 5).is_empty());
    }
}
