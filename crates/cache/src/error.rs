//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No text could be obtained for a reference. Callers are expected to
    /// fall back rather than retry.
    #[display("unable to resolve {_0}")]
    ResolutionFailed(#[error(not(source))] String),
    /// The persisted cache is not a valid record. Never returned from
    /// `resolve`; the cache is treated as empty and rewritten.
    #[display("persisted verse cache is corrupted: {_0}")]
    StorageCorrupted(#[error(not(source))] String),
    /// The backing store rejected an explicit maintenance operation.
    #[display("verse cache store error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResolutionFailed(_) | Self::Storage)
    }
}
