//! Fallback Error Types
//!
//! Tier failures are values the chain matches on; none of them ever leave
//! [`FallbackChain::get_emergency_verses`](crate::FallbackChain::get_emergency_verses).

use crate::tier::FallbackTier;
use derive_more::{Display, Error};

/// A fallback error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fallback operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tier could not contribute a single verse.
    #[display("fallback tier {_0} produced no verses")]
    TierExhausted(#[error(not(source))] FallbackTier),
    /// A bundled table entry does not name a valid reference.
    #[display("invalid table reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TierExhausted(FallbackTier::Popular))
    }
}
