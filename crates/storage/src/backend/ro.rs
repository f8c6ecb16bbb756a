//! Read-only key-value store.
//!
//! Wraps another store and prevents writes from executing, while still
//! indicating success on return.

use async_trait::async_trait;

use crate::{KeyValueStore, StoreHandle, error::Result};

/// Read-only key-value store.
///
/// Wraps another store and silently drops all write operations, logging an
/// [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: StoreHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl KeyValueStore for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tracing::info!(key, bytes = value.len(), "Skipping write during read-only mode");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        tracing::info!(key, "Skipping remove during read-only mode");
        Ok(())
    }
}
