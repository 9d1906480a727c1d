//! Retrieval & context assembly: the retriever (C10) and code chunk
//! prioritizer (C11).

pub mod prioritize;
pub mod retriever;

pub use prioritize::prioritize_code_chunks;
pub use retriever::{RetrievalResult, retrieve};
