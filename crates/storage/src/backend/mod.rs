//! Key-value store trait and implementations.
//!
//! This module defines the [`KeyValueStore`] trait, the single persistence
//! seam for distribution state and resolved verse text. Values are opaque
//! strings; structured records go through the [`json`](crate::json) helpers.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use async_trait::async_trait;

/// Unified interface for persisted key-value storage.
///
/// All operations are asynchronous so that implementations backed by slow
/// media or remote services don't block the runtime. Keys must pass
/// [`validate_key`](crate::validate_key); implementations enforce this.
///
/// # Examples
///
/// ```
/// use lectio_storage::{backend::KeyValueStore, error::Result};
///
/// async fn length_of_stored_value(store: &dyn KeyValueStore) -> Result<usize> {
///     Ok(store.get("bible_verse_cache").await?.map(|value| value.len()).unwrap_or(0))
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Read the value stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Implementations must never leave a partially written value behind: a
    /// reader observes either the previous value or the new one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Check whether a value is stored under `key`.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
