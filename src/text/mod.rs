//! Text processing primitives: token budgeting, cleaning, encoding
//! detection, stop words, language classification, and sentence splitting.

pub mod clean;
pub mod encoding;
pub mod language;
pub mod sentences;
pub mod stopwords;
pub mod tokens;

pub use clean::{clean_text, content_hash};
pub use encoding::{Encoding, decode};
pub use language::detect_language;
pub use sentences::split_sentences;
pub use tokens::{Budgets, estimate_tokens, partition_budget};
