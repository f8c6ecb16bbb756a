//! Service Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Runtime failures inside the service are absorbed by fallbacks; these are
/// the ones a caller can act on.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested batch size is zero or larger than the universe.
    #[display("batch of {requested} cannot be served from a universe of {universe}")]
    BatchTooLarge { requested: usize, universe: usize },
    /// Configuration could not be loaded or is invalid.
    #[display("configuration error")]
    Config,
    /// The persisted store could not be opened or rejected a maintenance operation.
    #[display("storage error")]
    Storage,
    /// The text provider could not be constructed.
    #[display("text provider error")]
    Provider,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
