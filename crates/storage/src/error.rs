//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Key is empty, too long, or contains characters outside the allowed set
    #[display("invalid key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Storage root is not an absolute path to a directory
    #[display("invalid storage root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Access denied (permissions)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Stored value exists but cannot be read back as text
    #[display("corrupted value for key: {_0}")]
    Corrupted(#[error(not(source))] String),
    /// Value could not be encoded for storage
    #[display("unable to encode value for key: {_0}")]
    Encode(#[error(not(source))] String),
    /// The store cannot be reached at all
    #[display("store unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidKey("a/b".to_string()).to_string(), r#"invalid key: "a/b""#);
        assert_eq!(ErrorKind::Unavailable("mock".to_string()).to_string(), "store unavailable: mock");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Unavailable("mock".to_string()).is_retryable());
        assert!(!ErrorKind::InvalidKey(String::new()).is_retryable());
        assert!(!ErrorKind::Corrupted("cache".to_string()).is_retryable());
    }
}
