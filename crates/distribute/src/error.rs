//! Distribution Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A distribution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for distribution operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested batch size is zero or larger than the universe. This is a
    /// programmer error; retrying the same call will fail the same way.
    #[display("batch of {requested} cannot be served from a universe of {universe}")]
    BatchTooLarge { requested: usize, universe: usize },
    /// Persisted state exists but is not a valid distribution record.
    /// Never returned from public operations; the state is regenerated.
    #[display("persisted distribution state is corrupted: {_0}")]
    StorageCorrupted(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
