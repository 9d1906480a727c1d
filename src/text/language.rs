//! Lightweight language classification over a text sample (C7).

use super::stopwords::Language;

const SAMPLE_CHARS: usize = 500;

/// Classifies the dominant language of `text` by scoring discriminative
/// tokens in the first 500 characters. Defaults to English when no
/// language scores higher than zero.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    let sample: String = text.chars().take(SAMPLE_CHARS).collect();
    let lower = sample.to_lowercase();

    let cyrillic_count = lower.chars().filter(|c| matches!(*c, '\u{0400}'..='\u{04FF}')).count();
    if cyrillic_count > 20 {
        return Language::Ru;
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    let score = |set: &[&str]| words.iter().filter(|w| set.contains(w)).count();

    let mut de_score = score(super::stopwords::stopwords(Language::De));
    if lower.chars().any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß')) {
        de_score += 3;
    }
    let fr_score = score(super::stopwords::stopwords(Language::Fr));
    let es_score = score(super::stopwords::stopwords(Language::Es));
    let en_score = score(super::stopwords::stopwords(Language::En));

    let scores = [
        (Language::En, en_score),
        (Language::De, de_score),
        (Language::Fr, fr_score),
        (Language::Es, es_score),
    ];

    let mut best = scores[0];
    for candidate in &scores[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        assert_eq!(detect_language("The quick brown fox jumps over the lazy dog and runs away"), Language::En);
    }

    #[test]
    fn test_detects_german_via_umlauts_and_stopwords() {
        let text = "Der Hund lauft schnell uber die Strasse und mochte spielen. Das ist schon fur die Katze.";
        assert_eq!(detect_language(text), Language::De);
    }

    #[test]
    fn test_detects_russian_via_cyrillic_count() {
        let text = "Это длинный текст на русском языке который содержит больше двадцати кириллических букв точно";
        assert_eq!(detect_language(text), Language::Ru);
    }

    #[test]
    fn test_defaults_to_english_on_empty_input() {
        assert_eq!(detect_language(""), Language::En);
    }
}
