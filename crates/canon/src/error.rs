//! Canon Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A canon error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for canon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The reference string does not look like `Book chapter:verse[-verse]`.
    #[display("malformed reference: {_0}")]
    Malformed(#[error(not(source))] String),
    /// The book name (or abbreviation) is not one of the 66 canonical books.
    #[display("unknown book: {_0}")]
    UnknownBook(#[error(not(source))] String),
    /// The chapter or verse does not exist in the named book.
    #[display("{book} {chapter}:{verse} does not exist")]
    OutOfRange {
        book: &'static str,
        chapter: u16,
        verse: u16,
    },
    /// A verse range that ends before it starts.
    #[display("reversed verse range: {start}-{end}")]
    ReversedRange { start: u16, end: u16 },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // References are either valid or they aren't.
        false
    }
}
