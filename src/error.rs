//! Error types for the retrieval-augmented conversation core.
//!
//! Provides a comprehensive error hierarchy using `thiserror` covering
//! storage, inference, text processing, configuration, and turn-level
//! control flow.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the `Store` collaborator.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Errors from the `Inference` collaborator.
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Text-processing errors (chunking, encoding, parsing).
    #[error("text processing error: {0}")]
    Text(#[from] TextError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration is structurally invalid.
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of why the configuration is invalid.
        message: String,
    },

    /// An invariant expected by the caller does not hold.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// The operation was cancelled cooperatively (not an error condition,
    /// but threaded through the same `Result` so callers can match on it).
    #[error("operation cancelled")]
    Cancelled,

    /// A referenced entity does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// What was not found (e.g. "document abc123").
        what: String,
    },
}

/// Errors from the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Chat does not exist.
    #[error("chat not found: {chat_id}")]
    ChatNotFound {
        /// The chat id that was not found.
        chat_id: String,
    },
}

/// Errors from the inference collaborator (embeddings, chat completion,
/// reranking).
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The request to the inference endpoint failed transport-level.
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint returned a response this crate could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The streaming completion ended without a terminal marker.
    #[error("stream ended unexpectedly")]
    StreamTruncated,

    /// Reranking is not supported by this adapter.
    #[error("reranking not supported")]
    RerankUnsupported,
}

/// Errors from text processing (chunking, encoding detection, parsing).
#[derive(Error, Debug)]
pub enum TextError {
    /// Could not confidently decode a byte buffer to text.
    #[error("encoding detection failed: {0}")]
    Encoding(String),

    /// Chunking configuration is invalid (e.g. overlap >= chunk size).
    #[error("invalid chunk configuration: {reason}")]
    InvalidChunkConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// File type is not supported for ingestion.
    #[error("unsupported file type: {path}")]
    Unsupported {
        /// Path of the unsupported file.
        path: String,
    },

    /// Failed to parse a structured response (JSON facts, rerank scores).
    #[error("parse error: {0}")]
    Parse(String),

    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<regex::Error> for TextError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<serde_json::Error> for TextError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidState {
            message: "test error".to_string(),
        };
        assert_eq!(err.to_string(), "invalid state: test error");
    }

    #[test]
    fn test_config_invalid_display() {
        let err = Error::ConfigInvalid {
            message: "excerpts + history > 1".to_string(),
        };
        assert!(err.to_string().contains("excerpts"));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            what: "document abc123".to_string(),
        };
        assert_eq!(err.to_string(), "not found: document abc123");
    }

    #[test]
    fn test_store_error_variants() {
        let err = StoreError::ChatNotFound {
            chat_id: "chat-1".to_string(),
        };
        assert!(err.to_string().contains("chat-1"));
    }

    #[test]
    fn test_inference_error_variants() {
        let err = InferenceError::StreamTruncated;
        assert_eq!(err.to_string(), "stream ended unexpectedly");

        let err = InferenceError::RerankUnsupported;
        assert!(err.to_string().contains("reranking"));
    }

    #[test]
    fn test_text_error_variants() {
        let err = TextError::Unsupported {
            path: "foo.bin".to_string(),
        };
        assert!(err.to_string().contains("foo.bin"));

        let err = TextError::InvalidChunkConfig {
            reason: "overlap >= chunk size".to_string(),
        };
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(err, Error::Store(StoreError::Database(_))));
    }

    #[test]
    fn test_from_serde_json_error_to_text_error() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: TextError = json_err.into();
        assert!(matches!(err, TextError::Parse(_)));
    }

    #[test]
    #[allow(clippy::invalid_regex)]
    fn test_from_regex_error_to_text_error() {
        let Err(regex_err) = regex::Regex::new("[invalid") else {
            unreachable!("pattern is deliberately invalid")
        };
        let err: TextError = regex_err.into();
        assert!(matches!(err, TextError::Regex(_)));
    }
}
