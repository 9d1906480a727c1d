//! Excerpt extraction (C8): sentence-scored selection for prose, block-
//! structured selection for code (SQL blocks and generic line-scoring).
//!
//! Grounded on the teacher's `io/unicode.rs` sentence-splitting idiom,
//! extended with the scoring and reassembly rules of SPEC_FULL.md §4.8.

use crate::text::language::detect_language;
use crate::text::sentences::split_sentences;
use crate::text::stopwords::{Language, is_stopword};

/// Extracts query terms of at least 3 characters, lowercased, with stop
/// words removed, deduplicated.
fn query_terms(query: &str, lang: Language) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 3 && !is_stopword(w, lang))
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

fn term_overlap(text: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let hits = terms.iter().filter(|t| lower.contains(t.as_str())).count();
    hits as f64 / terms.len() as f64
}

/// Extracts a relevance-ranked excerpt from prose `content` for `query`,
/// bounded to `max_chars`. Returns `content` unchanged if it already fits.
#[must_use]
pub fn excerpt_prose(content: &str, query: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }

    let lang = detect_language(query);
    let terms = query_terms(query, lang);
    let sentences: Vec<&str> = split_sentences(content);
    if sentences.is_empty() {
        return truncate_chars(content, max_chars);
    }

    let mut scored: Vec<(usize, &str, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let overlap = term_overlap(s, &terms);
            let length_boost = (s.len() as f64 / 200.0).clamp(0.0, 2.0);
            (i, *s, overlap * (1.0 + 0.1 * length_boost))
        })
        .collect();
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<usize> = Vec::new();
    let mut used = 0usize;
    for (idx, text, _) in &scored {
        let add = text.len() + 1;
        if used + add > max_chars && !selected.is_empty() {
            continue;
        }
        selected.push(*idx);
        used += add;
        if used >= max_chars {
            break;
        }
    }

    if selected.is_empty() {
        return truncate_chars(content, max_chars);
    }

    selected.sort_unstable();
    let omitted = selected.len() < sentences.len();
    let joined = selected.iter().map(|&i| sentences[i].trim()).collect::<Vec<_>>().join(" ");

    let result = if omitted { format!("…{joined}…") } else { joined };
    truncate_chars(&result, max_chars)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlBlockKind {
    Header,
    HeaderComment,
    Block,
    Statement,
}

struct SqlBlock<'a> {
    kind: SqlBlockKind,
    text: &'a str,
    start: usize,
}

/// Parses SQL `content` into logical blocks: procedure headers (ended by a
/// standalone `AS`), `BEGIN...END` trees, semicolon-terminated statements,
/// and comment runs immediately preceding a header keyword.
fn parse_sql_blocks(content: &str) -> Vec<SqlBlock<'_>> {
    let upper = content.to_uppercase();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < content.len() {
        let rest = &content[pos..];
        let rest_upper = &upper[pos..];
        let trimmed_offset = rest.len() - rest.trim_start().len();
        if trimmed_offset == rest.len() {
            break;
        }
        let start = pos + trimmed_offset;

        if rest_upper.trim_start().starts_with("--") || rest_upper.trim_start().starts_with("/*") {
            let end = find_comment_run_end(content, start);
            let is_header_comment = content[end..]
                .trim_start()
                .to_uppercase()
                .starts_with("CREATE");
            blocks.push(SqlBlock {
                kind: if is_header_comment { SqlBlockKind::HeaderComment } else { SqlBlockKind::Statement },
                text: content[start..end].trim_end(),
                start,
            });
            pos = end;
            continue;
        }

        if rest_upper.trim_start().starts_with("CREATE") {
            if let Some(as_pos) = find_standalone_as(content, start) {
                blocks.push(SqlBlock { kind: SqlBlockKind::Header, text: content[start..as_pos].trim_end(), start });
                pos = as_pos;
                continue;
            }
        }

        if rest_upper.trim_start().starts_with("BEGIN") {
            let end = find_matching_end(content, start);
            blocks.push(SqlBlock { kind: SqlBlockKind::Block, text: content[start..end].trim_end(), start });
            pos = end;
            continue;
        }

        let end = content[start..].find(';').map_or(content.len(), |rel| start + rel + 1);
        if end > start {
            blocks.push(SqlBlock { kind: SqlBlockKind::Statement, text: content[start..end].trim_end(), start });
        }
        pos = end.max(start + 1);
    }

    blocks
}

fn find_comment_run_end(content: &str, start: usize) -> usize {
    let mut pos = start;
    loop {
        let rest = &content[pos..];
        let trimmed = rest.trim_start();
        let lead = rest.len() - trimmed.len();
        if trimmed.starts_with("--") {
            let line_end = trimmed.find('\n').map_or(content.len(), |r| pos + lead + r + 1);
            pos = line_end;
        } else if trimmed.starts_with("/*") {
            let close = trimmed.find("*/").map_or(trimmed.len(), |r| r + 2);
            pos += lead + close;
        } else {
            break;
        }
    }
    pos
}

fn find_standalone_as(content: &str, start: usize) -> Option<usize> {
    let upper = content.to_uppercase();
    let mut search_from = start;
    loop {
        let rel = upper[search_from..].find("AS")?;
        let at = search_from + rel;
        let before_ok = at == 0 || !content.as_bytes()[at - 1].is_ascii_alphanumeric();
        let after = at + 2;
        let after_ok = after >= content.len() || !content.as_bytes()[after].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return Some(after);
        }
        search_from = at + 2;
        if search_from >= content.len() {
            return None;
        }
    }
}

fn find_matching_end(content: &str, start: usize) -> usize {
    let upper = content.to_uppercase();
    let mut depth = 0i32;
    let mut pos = start;
    loop {
        let rest = &upper[pos..];
        let next_begin = rest.find("BEGIN");
        let next_end = rest.find("END");
        match (next_begin, next_end) {
            (_, None) => return content.len(),
            (Some(b), Some(e)) if b < e => {
                depth += 1;
                pos += b + 5;
            }
            (_, Some(e)) => {
                depth -= 1;
                pos += e + 3;
                if depth <= 0 {
                    return pos;
                }
            }
        }
    }
}

fn sql_block_score(block: &SqlBlock<'_>, terms: &[String]) -> f64 {
    let base = match block.kind {
        SqlBlockKind::Header => 100.0,
        SqlBlockKind::HeaderComment => 90.0,
        SqlBlockKind::Block => 60.0,
        SqlBlockKind::Statement => 40.0,
    };
    let overlap_bonus = term_overlap(block.text, terms) * 30.0;
    let score = base + overlap_bonus;
    if block.text.len() > 1000 { score * 0.9 } else { score }
}

/// Extracts a relevance-ranked excerpt from SQL `content` for `query`,
/// bounded to `max_chars`. Returns `content` unchanged if it already fits.
#[must_use]
pub fn excerpt_sql(content: &str, query: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }

    let lang = detect_language(query);
    let terms = query_terms(query, lang);
    let blocks = parse_sql_blocks(content);
    if blocks.is_empty() {
        return truncate_chars(content, max_chars);
    }

    let mut scored: Vec<(usize, f64)> = blocks.iter().enumerate().map(|(i, b)| (i, sql_block_score(b, &terms))).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<usize> = Vec::new();
    let mut used = 0usize;
    for (idx, _) in &scored {
        let add = blocks[*idx].text.len();
        if used + add > max_chars && !selected.is_empty() {
            continue;
        }
        selected.push(*idx);
        used += add;
        if used >= max_chars {
            break;
        }
    }
    if selected.is_empty() {
        return truncate_chars(content, max_chars);
    }
    selected.sort_unstable();

    let mut out = String::new();
    for (i, &idx) in selected.iter().enumerate() {
        if i > 0 {
            let prev_idx = selected[i - 1];
            if idx != prev_idx + 1 {
                out.push_str("\n...\n");
            } else {
                out.push('\n');
            }
        }
        out.push_str(blocks[idx].text);
    }
    truncate_chars(&out, max_chars)
}

const DEFINITION_ANCHORS: [&str; 3] = ["func ", "def ", "class "];

/// Extracts a relevance-ranked excerpt from non-SQL code `content` for
/// `query`: lines are scored by term overlap plus bonuses for definition
/// anchors and top-of-file comments, bounded to `max_chars`.
#[must_use]
pub fn excerpt_code(content: &str, query: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }

    let lang = detect_language(query);
    let terms = query_terms(query, lang);
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return truncate_chars(content, max_chars);
    }

    let mut scored: Vec<(usize, f64)> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut score = term_overlap(line, &terms) * 10.0;
            if DEFINITION_ANCHORS.iter().any(|a| line.contains(a)) {
                score += 5.0;
            }
            if i < 3 && (line.trim_start().starts_with("//") || line.trim_start().starts_with('#')) {
                score += 2.0;
            }
            (i, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<usize> = Vec::new();
    let mut used = 0usize;
    for (idx, _) in &scored {
        let add = lines[*idx].len() + 1;
        if used + add > max_chars && !selected.is_empty() {
            continue;
        }
        selected.push(*idx);
        used += add;
        if used >= max_chars {
            break;
        }
    }
    if selected.is_empty() {
        return truncate_chars(content, max_chars);
    }
    selected.sort_unstable();

    let mut out = String::new();
    for (i, &idx) in selected.iter().enumerate() {
        if i > 0 {
            let prev_idx = selected[i - 1];
            out.push_str(if idx != prev_idx + 1 { "\n...\n" } else { "\n" });
        }
        out.push_str(lines[idx]);
    }
    truncate_chars(&out, max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let end = crate::io::unicode::find_char_boundary(s, max_chars);
    s[..end].to_string()
}
