//! Key validation.
//!
//! Keys double as file names for the [`LocalBackend`](crate::backend::LocalBackend),
//! so the accepted alphabet is deliberately small.

use crate::error::{ErrorKind, Result};

/// Longest accepted key, in bytes.
pub const MAX_KEY_LENGTH: usize = 128;

/// Validates a storage key.
///
/// Keys must be non-empty, at most [`MAX_KEY_LENGTH`] bytes, consist only
/// of ASCII alphanumerics, `_`, `-` and `.`, and must not start with `.`
/// (leading dots are reserved for temporary files).
///
/// # Examples
///
/// ```
/// use lectio_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("bible_verse_cache").is_ok());
/// assert!(validate_key("sequential-verse-system.v1").is_ok());
/// // Invalid keys
/// assert!(validate_key("").is_err());
/// assert!(validate_key("../escape").is_err());
/// assert!(validate_key(".hidden").is_err());
/// assert!(validate_key("with space").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || key.starts_with('.') || !key.chars().all(allowed) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a")]
    #[case("bible_verse_cache")]
    #[case("sequential_verse_system")]
    #[case("state.v1")]
    #[case("UPPER-lower_09")]
    fn test_valid_keys(#[case] key: &str) {
        assert_eq!(validate(key).unwrap(), key);
    }

    #[rstest]
    #[case("")]
    #[case(".tmp")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("..")]
    #[case("a\0b")]
    #[case("ключ")]
    fn test_invalid_keys(#[case] key: &str) {
        let err = validate(key).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn test_key_length_limit() {
        assert!(validate(&"k".repeat(MAX_KEY_LENGTH)).is_ok());
        assert!(validate(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }
}
