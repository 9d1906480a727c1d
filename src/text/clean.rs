//! Text cleaning and content hashing (C2).

use sha2::{Digest, Sha256};

/// Strips invisible/zero-width characters, collapses horizontal whitespace
/// runs, trims whitespace on both sides of each newline, and collapses 3+
/// consecutive newlines down to exactly two.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect();

    let mut collapsed = String::with_capacity(stripped.len());
    let mut prev_space = false;
    for c in stripped.chars() {
        if c == ' ' || c == '\t' {
            if !prev_space {
                collapsed.push(' ');
            }
            prev_space = true;
        } else {
            collapsed.push(c);
            prev_space = false;
        }
    }

    let trimmed: String = collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    collapse_blank_lines(&trimmed)
}

fn collapse_blank_lines(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut newline_run = 0;
    for c in s.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                result.push(c);
            }
        } else {
            newline_run = 0;
            result.push(c);
        }
    }
    result
}

/// Hex-encoded SHA-256 of raw bytes, used for document dedup
/// (`Document::content_hash`).
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_idempotent() {
        let input = "Hello\u{200B}   world\n\n\n\nBye   ";
        let once = clean_text(input);
        let twice = clean_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_text_strips_zero_width() {
        let cleaned = clean_text("a\u{200B}b\u{FEFF}c");
        assert_eq!(cleaned, "abc");
    }

    #[test]
    fn test_clean_text_collapses_spaces() {
        let cleaned = clean_text("a    b\t\tc");
        assert_eq!(cleaned, "a b c");
    }

    #[test]
    fn test_clean_text_trims_spaces_on_both_sides_of_newline() {
        let cleaned = clean_text("a \n  b");
        assert_eq!(cleaned, "a\nb");
    }

    #[test]
    fn test_clean_text_collapses_excess_blank_lines() {
        let cleaned = clean_text("a\n\n\n\n\nb");
        assert_eq!(cleaned, "a\n\nb");
    }

    #[test]
    fn test_content_hash_deterministic_and_sensitive() {
        let h1 = content_hash(b"hello");
        let h2 = content_hash(b"hello");
        let h3 = content_hash(b"hellp");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }
}
