//! Low-level I/O and Unicode utilities shared by the text and chunking
//! modules.

pub mod unicode;

pub use unicode::find_char_boundary;
