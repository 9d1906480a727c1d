//! Structure-aware chunking: prose (C4) and source code (C5).

pub mod code;
pub mod prose;

pub use code::{Language, chunk_code, detect_language};
pub use prose::chunk_prose;

/// File extensions recognized as source code; anything else ingests via the
/// prose chunker.
const CODE_EXTENSIONS: [&str; 23] = [
    "go", "py", "js", "ts", "tsx", "jsx", "java", "c", "cpp", "h", "rs", "cs", "php", "rb", "swift",
    "kt", "scala", "m", "sh", "bash", "sql", "r", "vue",
];

/// Whether `path`'s extension marks it as source code rather than prose.
#[must_use]
pub fn is_code_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_code_file_recognizes_extensions() {
        assert!(is_code_file(std::path::Path::new("main.rs")));
        assert!(is_code_file(std::path::Path::new("script.PY")));
        assert!(!is_code_file(std::path::Path::new("notes.md")));
        assert!(!is_code_file(std::path::Path::new("README")));
    }
}
