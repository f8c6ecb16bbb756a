//! Provider Error Types
//!
//! Every kind here means the network path is unavailable for this reference;
//! none of them are ever shown to an end user.

use derive_more::{Display, Error};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request could not be sent or the connection failed.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// No response within the configured timeout.
    #[display("request timed out")]
    Timeout,
    /// Upstream answered with a non-success status.
    #[display("upstream returned status {_0}")]
    Status(#[error(not(source))] u16),
    /// Response body does not match the endpoint's declared format.
    #[display("unexpected {_0} response")]
    Format(#[error(not(source))] &'static str),
    /// Response parsed, but holds no text for the requested verses.
    #[display("response contains no text for the requested verses")]
    Empty,
    /// Endpoint definition is unusable.
    #[display("invalid endpoint: {_0}")]
    InvalidEndpoint(#[error(not(source))] String),
    /// No endpoints are configured.
    #[display("no endpoints configured")]
    NoEndpoints,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Status(_))
    }
}
