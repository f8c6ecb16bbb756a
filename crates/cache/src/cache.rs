use crate::error::{ErrorKind, Result};
use crate::models::{CacheKey, CacheRecord, CacheStats, EntryRecord, SCHEMA_VERSION};
use crate::provider::{self, Passage, ProviderHandle};
use exn::ResultExt;
use lectio_canon::VerseReference;
use lectio_storage::StoreHandle;
use lectio_storage::json::{self, Loaded};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;
use tokio::sync::Mutex;

/// Store key used when none is configured.
pub const DEFAULT_CACHE_KEY: &str = "bible_verse_cache";
const SECONDS_PER_DAY: u64 = 86_400;

/// Tunables for [`TextResolutionCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Upper bound on stored entries; the oldest are evicted beyond it.
    pub max_entries: usize,
    /// Age at which an entry stops being served.
    pub ttl: Duration,
    /// Upper bound on a single provider fetch.
    pub fetch_timeout: Duration,
    /// Store key holding the whole cache.
    pub key: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 500,
            ttl: Duration::from_secs(30 * SECONDS_PER_DAY),
            fetch_timeout: Duration::from_secs(10),
            key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

/// Resolves references to text through a bounded, expiring persisted cache.
///
/// The cache is one record in the store, re-read before every change so
/// that overlapping calls never lose each other's writes. Concurrent
/// resolutions of the same key share a single provider fetch. Store
/// failures degrade to cache misses; they never fail a resolution.
pub struct TextResolutionCache {
    store: StoreHandle,
    provider: ProviderHandle,
    settings: CacheSettings,
    /// Serializes read-modify-write of the persisted record.
    write_lock: Mutex<()>,
    /// One lock per key with a fetch in progress.
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl TextResolutionCache {
    pub fn new(store: StoreHandle, provider: ProviderHandle) -> Self {
        Self::with_settings(store, provider, CacheSettings::default())
    }

    pub fn with_settings(store: StoreHandle, provider: ProviderHandle, settings: CacheSettings) -> Self {
        Self {
            store,
            provider,
            settings,
            write_lock: Mutex::new(()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Resolve `reference` in translation `version`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ResolutionFailed`] when the entry is not cached and the
    /// provider fails or times out. The cache is left unchanged.
    #[tracing::instrument(level = "debug", skip(self, reference), fields(%reference))]
    pub async fn resolve(&self, reference: &VerseReference, version: &str) -> Result<Passage> {
        let key = CacheKey::new(*reference, version);
        if let Some(passage) = self.lookup(&key).await {
            return Ok(passage);
        }

        let lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        let result = {
            let _guard = lock.lock().await;
            // Another call may have fetched this key while we waited.
            match self.lookup(&key).await {
                Some(passage) => Ok(passage),
                None => self.fetch_and_store(&key).await,
            }
        };
        {
            let mut inflight = self.inflight.lock().await;
            // Ours plus the map's: nobody else is waiting on this key.
            if Arc::strong_count(&lock) <= 2 {
                inflight.remove(&key);
            }
        }
        result
    }

    /// Resolve every reference, ignoring individual failures. Returns how
    /// many resolved.
    #[tracing::instrument(skip(self, references))]
    pub async fn preload(&self, references: &[VerseReference], version: &str) -> usize {
        let mut resolved = 0;
        for reference in references {
            match self.resolve(reference, version).await {
                Ok(_) => resolved += 1,
                Err(err) => tracing::debug!(%reference, error = ?err, "Skipping reference during preload"),
            }
        }
        tracing::info!(resolved, requested = references.len(), "Preloaded verse cache");
        resolved
    }

    /// Drop the entire cache.
    #[tracing::instrument(skip(self), fields(store = self.store.name()))]
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(&self.settings.key).await.or_raise(|| ErrorKind::Storage)?;
        tracing::info!("Cleared verse cache");
        Ok(())
    }

    /// Physically remove expired entries. Returns how many were removed.
    #[tracing::instrument(skip(self), fields(store = self.store.name()))]
    pub async fn purge_expired(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load().await.or_raise(|| ErrorKind::Storage)?;
        let purged = record.purge_expired(UtcDateTime::now(), self.settings.ttl);
        if purged > 0 {
            json::save(&*self.store, &self.settings.key, &record).await.or_raise(|| ErrorKind::Storage)?;
            tracing::info!(purged, "Purged expired verse cache entries");
        }
        Ok(purged)
    }

    /// Size and bounds of the cache. An unreadable store reports as empty.
    pub async fn stats(&self) -> CacheStats {
        let now = UtcDateTime::now();
        let (record, approx_size_bytes) = match self.store.get(&self.settings.key).await {
            Ok(Some(raw)) => {
                let record = serde_json::from_str::<CacheRecord>(&raw).unwrap_or_default();
                (record, raw.len())
            },
            Ok(None) => (CacheRecord::default(), 0),
            Err(err) => {
                tracing::warn!(error = ?err, "Verse cache store unavailable");
                (CacheRecord::default(), 0)
            },
        };
        CacheStats {
            entry_count: record.entries.len(),
            live_count: record.entries.values().filter(|entry| !entry.is_expired(now, self.settings.ttl)).count(),
            approx_size_bytes,
            max_entries: self.settings.max_entries,
            ttl_days: self.settings.ttl.as_secs() / SECONDS_PER_DAY,
        }
    }

    /// Check that the persisted cache can be read and parsed.
    pub async fn is_readable(&self) -> bool {
        matches!(
            json::load::<CacheRecord>(&*self.store, &self.settings.key).await,
            Ok(Loaded::Absent) | Ok(Loaded::Present(CacheRecord { schema: SCHEMA_VERSION, .. }))
        )
    }

    /// A live entry for `key`, if one is cached.
    async fn lookup(&self, key: &CacheKey) -> Option<Passage> {
        let record = match self.load().await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = ?err, "Verse cache store unavailable; treating as a miss");
                return None;
            },
        };
        let Some(entry) = record.entries.get(&key.to_string()) else {
            tracing::debug!(%key, "Verse cache miss");
            return None;
        };
        if entry.is_expired(UtcDateTime::now(), self.settings.ttl) {
            tracing::debug!(%key, "Verse cache entry expired");
            if let Err(err) = self.remove_expired(key).await {
                tracing::warn!(%key, error = ?err, "Unable to remove expired verse cache entry");
            }
            return None;
        }
        tracing::debug!(%key, "Verse cache hit");
        Some(Passage {
            text: entry.text.clone(),
            source: entry.source.clone(),
        })
    }

    async fn fetch_and_store(&self, key: &CacheKey) -> Result<Passage> {
        let fetched = tokio::time::timeout(self.settings.fetch_timeout, self.provider.fetch(key.reference(), key.version()))
            .await
            .unwrap_or_else(|_| Err(exn::Exn::from(provider::ErrorKind::Timeout)));
        let passage = match fetched {
            Ok(passage) => passage,
            Err(err) => {
                tracing::debug!(%key, provider = self.provider.name(), error = ?err, "Provider failed");
                return Err(err.raise(ErrorKind::ResolutionFailed(key.to_string())));
            },
        };
        if let Err(err) = self.commit(key, &passage).await {
            tracing::warn!(%key, error = ?err, "Unable to persist verse cache; serving uncached text");
        }
        Ok(passage)
    }

    /// Insert a fetched entry and enforce the bounds.
    async fn commit(&self, key: &CacheKey, passage: &Passage) -> lectio_storage::error::Result<()> {
        let _guard = self.write_lock.lock().await;
        let now = UtcDateTime::now();
        // A failed read is not an empty cache.
        let mut record = self.load().await?;
        record.entries.insert(
            key.to_string(),
            EntryRecord {
                text: passage.text.clone(),
                fetched_at: now.unix_timestamp(),
                source: passage.source.clone(),
            },
        );
        let purged = record.purge_expired(now, self.settings.ttl);
        let evicted = record.evict_oldest(self.settings.max_entries, Some(&key.to_string()));
        if purged + evicted > 0 {
            tracing::info!(purged, evicted, "Trimmed verse cache");
        }
        json::save(&*self.store, &self.settings.key, &record).await?;
        Ok(())
    }

    /// Drop `key` if it is still expired once the write lock is held.
    async fn remove_expired(&self, key: &CacheKey) -> lectio_storage::error::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load().await?;
        let key = key.to_string();
        let expired = record
            .entries
            .get(&key)
            .is_some_and(|entry| entry.is_expired(UtcDateTime::now(), self.settings.ttl));
        if expired {
            record.entries.remove(&key);
            json::save(&*self.store, &self.settings.key, &record).await?;
        }
        Ok(())
    }

    /// The persisted record; corrupted or unknown layouts read as empty.
    async fn load(&self) -> lectio_storage::error::Result<CacheRecord> {
        Ok(match json::load::<CacheRecord>(&*self.store, &self.settings.key).await? {
            Loaded::Present(record) if record.schema == SCHEMA_VERSION => record,
            Loaded::Present(record) => {
                let err = exn::Exn::from(ErrorKind::StorageCorrupted(format!("unknown schema {}", record.schema)));
                tracing::warn!(error = ?err, "Discarding verse cache");
                CacheRecord::default()
            },
            Loaded::Corrupted(reason) => {
                let err = exn::Exn::from(ErrorKind::StorageCorrupted(reason));
                tracing::warn!(error = ?err, "Discarding verse cache");
                CacheRecord::default()
            },
            Loaded::Absent => CacheRecord::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use lectio_storage::KeyValueStore;
    use lectio_storage::backend::MockBackend;
    use std::sync::atomic::{AtomicBool, Ordering};

    const JOHN_3_16: &str = "For God so loved the world, that he gave his only begotten Son";

    fn reference(text: &str) -> VerseReference {
        text.parse().unwrap()
    }

    fn cache(store: &Arc<MockBackend>, provider: &Arc<MockProvider>) -> TextResolutionCache {
        TextResolutionCache::new(store.clone(), provider.clone())
    }

    /// A persisted cache holding John 3:16 fetched `age_days` ago.
    fn seeded_store(age_days: i64) -> Arc<MockBackend> {
        let fetched_at = UtcDateTime::now().unix_timestamp() - age_days * 86_400;
        let record = serde_json::json!({
            "schema": 1,
            "entries": {
                "John 3:16|KJV": { "text": "stale text", "fetched_at": fetched_at, "source": "seed" }
            }
        });
        Arc::new(MockBackend::with_entries([(DEFAULT_CACHE_KEY, record.to_string())]))
    }

    #[tokio::test]
    async fn test_resolve_twice_fetches_once() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::with_texts([("John 3:16", JOHN_3_16)]));
        let cache = cache(&store, &provider);
        let first = cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        let second = cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert_eq!(first.text, JOHN_3_16);
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_versions_are_cached_separately() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let cache = cache(&store, &provider);
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        cache.resolve(&reference("John 3:16"), "kjv").await.unwrap();
        assert_eq!(provider.calls(), 1);
        cache.resolve(&reference("John 3:16"), "WEB").await.unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.stats().await.entry_count, 2);
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served() {
        let store = seeded_store(29);
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let passage = cache(&store, &provider).resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert_eq!(passage.text, "stale text");
        assert_eq!(passage.source, "seed");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let store = seeded_store(31);
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let cache = cache(&store, &provider);
        let passage = cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert_eq!(passage.text, JOHN_3_16);
        assert_eq!(provider.calls(), 1);
        // The refetched entry replaced the expired one.
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.stats().await.entry_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_even_if_refetch_fails() {
        let store = seeded_store(31);
        let provider = Arc::new(MockProvider::failing());
        let cache = cache(&store, &provider);
        assert_eq!(cache.stats().await.entry_count, 1);
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap_err();
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant("text"));
        let settings = CacheSettings {
            max_entries: 5,
            ..CacheSettings::default()
        };
        let cache = TextResolutionCache::with_settings(store.clone(), provider.clone(), settings);
        let references: Vec<VerseReference> = lectio_canon::universe()[..8].to_vec();
        for reference in &references {
            cache.resolve(reference, "KJV").await.unwrap();
        }
        let stats = cache.stats().await;
        assert_eq!(stats.entry_count, 5);
        assert_eq!(stats.max_entries, 5);
        // The most recent insert always survives eviction.
        cache.resolve(&references[7], "KJV").await.unwrap();
        assert_eq!(provider.calls(), 8);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_cache_unchanged() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::failing());
        let err = cache(&store, &provider).resolve(&reference("John 3:16"), "KJV").await.unwrap_err();
        assert_eq!(*err, ErrorKind::ResolutionFailed("John 3:16|KJV".to_string()));
        assert!(!store.contains(DEFAULT_CACHE_KEY).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16).with_delay(Duration::from_secs(60)));
        let err = cache(&store, &provider).resolve(&reference("John 3:16"), "KJV").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ResolutionFailed(_)));
        assert!(!store.contains(DEFAULT_CACHE_KEY).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_resolves_share_one_fetch() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16).with_delay(Duration::from_millis(200)));
        let cache = cache(&store, &provider);
        let john = reference("John 3:16");
        let (first, second) = tokio::join!(cache.resolve(&john, "KJV"), cache.resolve(&john, "KJV"));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(provider.calls(), 1);
        assert!(cache.inflight.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_resolves_of_different_keys_keep_both() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant("text").with_delay(Duration::from_millis(200)));
        let cache = cache(&store, &provider);
        let john = reference("John 3:16");
        let romans = reference("Romans 8:28");
        let (first, second) = tokio::join!(cache.resolve(&john, "KJV"), cache.resolve(&romans, "KJV"));
        first.unwrap();
        second.unwrap();
        assert_eq!(cache.stats().await.entry_count, 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_still_resolves() {
        let store = Arc::new(MockBackend::unavailable());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let cache = cache(&store, &provider);
        assert_eq!(cache.resolve(&reference("John 3:16"), "KJV").await.unwrap().text, JOHN_3_16);
        assert_eq!(cache.resolve(&reference("John 3:16"), "KJV").await.unwrap().text, JOHN_3_16);
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.stats().await.entry_count, 0);
        assert!(!cache.is_readable().await);
    }

    /// Reads fail on demand; writes always go through.
    struct FlakyReads {
        inner: MockBackend,
        failing: AtomicBool,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for FlakyReads {
        fn name(&self) -> &str {
            "flaky-reads"
        }

        async fn get(&self, key: &str) -> lectio_storage::error::Result<Option<String>> {
            if self.failing.load(Ordering::SeqCst) {
                exn::bail!(lectio_storage::error::ErrorKind::Unavailable("reads disabled".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> lectio_storage::error::Result<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> lectio_storage::error::Result<()> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_read_never_overwrites_cache() {
        let store = Arc::new(FlakyReads {
            inner: MockBackend::default(),
            failing: AtomicBool::new(false),
        });
        let provider = Arc::new(MockProvider::constant("text"));
        let cache = TextResolutionCache::new(store.clone(), provider.clone());
        let references = &lectio_canon::universe()[..11];
        for reference in &references[..10] {
            cache.resolve(reference, "KJV").await.unwrap();
        }
        assert_eq!(cache.stats().await.entry_count, 10);

        store.failing.store(true, Ordering::SeqCst);
        assert_eq!(cache.resolve(&references[10], "KJV").await.unwrap().text, "text");
        store.failing.store(false, Ordering::SeqCst);

        assert_eq!(cache.stats().await.entry_count, 10);
        cache.resolve(&references[0], "KJV").await.unwrap();
        assert_eq!(provider.calls(), 11);
    }

    #[tokio::test]
    async fn test_corrupted_cache_is_rebuilt() {
        let store = Arc::new(MockBackend::with_entries([(DEFAULT_CACHE_KEY, "{\"schema\":1,\"entries\":")]));
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let cache = cache(&store, &provider);
        assert!(!cache.is_readable().await);
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert!(cache.is_readable().await);
        assert_eq!(cache.stats().await.entry_count, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let cache = cache(&store, &provider);
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert!(cache.stats().await.approx_size_bytes > 0);
        cache.clear().await.unwrap();
        let stats = cache.stats().await;
        assert_eq!((stats.entry_count, stats.approx_size_bytes), (0, 0));
        cache.resolve(&reference("John 3:16"), "KJV").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_reports_store_failure() {
        let store = Arc::new(MockBackend::unavailable());
        let provider = Arc::new(MockProvider::constant(JOHN_3_16));
        let err = cache(&store, &provider).clear().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_preload_ignores_failures() {
        let store = Arc::new(MockBackend::default());
        let provider = Arc::new(MockProvider::with_texts([("John 3:16", JOHN_3_16), ("Psalm 23:1", "The LORD is my shepherd")]));
        let cache = cache(&store, &provider);
        let references = [reference("John 3:16"), reference("Genesis 1:1"), reference("Psalm 23:1")];
        assert_eq!(cache.preload(&references, "KJV").await, 2);
        assert_eq!(cache.stats().await.entry_count, 2);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = seeded_store(45);
        let provider = Arc::new(MockProvider::constant("text"));
        let cache = cache(&store, &provider);
        let stats = cache.stats().await;
        assert_eq!((stats.entry_count, stats.live_count, stats.ttl_days), (1, 0, 30));
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.stats().await.entry_count, 0);
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }
}
