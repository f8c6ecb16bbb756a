//! In-memory key-value store for testing.

use crate::error::{ErrorKind, Result};
use crate::{KeyValueStore, validate_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory key-value store for testing.
///
/// Values are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. The store can be
/// switched into an unavailable mode at any time to exercise failure paths.
///
/// # Examples
///
/// ```ignore
/// use lectio_storage::backend::{KeyValueStore, MockBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockBackend::with_entries([("state", "{}")]);
/// assert!(store.contains("state").await?);
///
/// store.set_unavailable(true);
/// assert!(store.get("state").await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MockBackend {
    /// Create a mock store pre-populated with values.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut map = HashMap::new();
        for (key, value) in entries {
            let key = key.into();
            if validate_key(&key).is_err() {
                panic!("MockBackend::with_entries: invalid key {key:?}");
            }
            map.insert(key, value.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            unavailable: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// A store on which every operation fails.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unavailable(true);
        store
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Toggle whether every operation fails with [`ErrorKind::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Unavailable(self.name.clone()));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let entries: [(&str, &str); 0] = [];
        Self::with_entries(entries)
    }
}

#[async_trait]
impl KeyValueStore for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let key = validate_key(key)?;
        Ok(self.storage.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        let key = validate_key(key)?;
        self.storage.write().await.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_available()?;
        let key = validate_key(key)?;
        self.storage.write().await.remove(key);
        Ok(())
    }
}
