//! Local filesystem key-value store.
//!
//! Each key maps to one file directly under the configured root directory.
//! Writes go to a temporary sibling first and are then renamed over the
//! target, so a crash mid-write never leaves a truncated value.

use crate::error::{ErrorKind, Result};
use crate::{KeyValueStore, validate_key};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Local filesystem key-value store.
///
/// # Examples
///
/// ```no_run
/// use lectio_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalBackend::new("local", "/var/lib/lectio")?;
/// # Ok(())
/// # }
/// ```
pub struct LocalBackend {
    name: String,
    root: PathBuf,
    /// Distinguishes temporary files of concurrent writers.
    sequence: AtomicU64,
}
impl LocalBackend {
    /// Create a new local filesystem store rooted at `root`.
    ///
    /// The directory is created if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, exists but is not a
    /// directory, or cannot be created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidRoot(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidRoot(root));
            }
        } else {
            // Only happens once at startup; not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self {
            name: name.into(),
            root,
            sequence: AtomicU64::new(0),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_key(key)?))
    }

    fn temporary_path_for(&self, key: &str) -> PathBuf {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        // Valid keys never start with a dot, so these can't collide with values.
        self.root.join(format!(".{key}.{}.{sequence}.tmp", std::process::id()))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl KeyValueStore for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => exn::bail!(Self::map_io_error(e, &path)),
        };
        let value = String::from_utf8(data).map_err(|_| exn::Exn::from(ErrorKind::Corrupted(key.to_string())))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let temporary = self.temporary_path_for(key);
        fs::write(&temporary, value).await.map_err(|e| Self::map_io_error(e, &temporary))?;
        if let Err(e) = fs::rename(&temporary, &path).await {
            let _ = fs::remove_file(&temporary).await;
            exn::bail!(Self::map_io_error(e, &path));
        }
        tracing::trace!(store = %self.name, key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => exn::bail!(Self::map_io_error(e, &path)),
        }
    }
}
