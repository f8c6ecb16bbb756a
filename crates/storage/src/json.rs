//! JSON records on top of a [`KeyValueStore`].
//!
//! Persisted state is always written as a single JSON document per key. A
//! value that fails to parse is reported as [`Loaded::Corrupted`] rather
//! than as an error: callers treat it the same as an absent value, after
//! logging it.

use crate::KeyValueStore;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Outcome of reading a JSON record.
#[derive(Debug, PartialEq, Eq)]
pub enum Loaded<T> {
    /// Nothing stored under the key.
    Absent,
    /// The stored value parsed successfully.
    Present(T),
    /// Something is stored, but it is not a valid record.
    Corrupted(String),
}
impl<T> Loaded<T> {
    /// The parsed record, treating corrupted values as absent.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Corrupted(_) => None,
        }
    }
}

/// Read and parse the JSON record stored under `key`.
///
/// # Errors
///
/// Only when the store itself fails. Parse failures are returned as
/// [`Loaded::Corrupted`].
pub async fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Loaded<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(Loaded::Absent);
    };
    Ok(match serde_json::from_str(&raw) {
        Ok(value) => Loaded::Present(value),
        Err(err) => Loaded::Corrupted(err.to_string()),
    })
}

/// Serialize `value` and store it under `key`.
///
/// Returns the number of bytes written.
pub async fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<usize> {
    let raw = serde_json::to_string(value).or_raise(|| ErrorKind::Encode(key.to_string()))?;
    store.set(key, &raw).await?;
    Ok(raw.len())
}
