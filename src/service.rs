use crate::error::{ErrorKind, Result};
use crate::models::{BatchVerse, HealthReport, RepairReport, ServiceStats, VerseSource};
use exn::ResultExt;
use futures::future::join_all;
use lectio_cache::TextResolutionCache;
#[cfg(feature = "http")]
use lectio_cache::provider::HttpProvider;
use lectio_cache::provider::ProviderHandle;
use lectio_canon::VerseReference;
use lectio_config::Config;
use lectio_distribute::{DistributionStats, SequentialDistributor};
use lectio_fallback::{EmergencyVerse, FallbackChain, FallbackTier, failsafe, popular_references};
use lectio_storage::StoreHandle;
#[cfg(feature = "http")]
use lectio_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub type ServiceHandle = Arc<VerseService>;

/// The verse subsystem, constructed once and shared by handle.
///
/// Every batch has exactly the requested number of verses: references come
/// from the [`SequentialDistributor`], text from the [`TextResolutionCache`],
/// and any slot that cannot be resolved is filled by the [`FallbackChain`].
pub struct VerseService {
    store: StoreHandle,
    provider: ProviderHandle,
    distributor: SequentialDistributor,
    cache: Arc<TextResolutionCache>,
    fallback: FallbackChain,
    version: String,
    state_key: String,
    batch_size: usize,
}

impl VerseService {
    pub fn new(store: StoreHandle, provider: ProviderHandle, config: &Config) -> Self {
        let cache = Arc::new(TextResolutionCache::with_settings(
            Arc::clone(&store),
            Arc::clone(&provider),
            config.cache.settings(),
        ));
        let distributor =
            SequentialDistributor::new(Arc::clone(&store)).with_key(config.distribution.state_key.as_str());
        Self {
            fallback: FallbackChain::new(Arc::clone(&cache), config.provider.version.as_str()),
            store,
            provider,
            distributor,
            cache,
            version: config.provider.version.clone(),
            state_key: config.distribution.state_key.clone(),
            batch_size: config.distribution.batch_size,
        }
    }

    /// Local files and the configured HTTP endpoints.
    ///
    /// With `storage.read_only` set, persisted state is read but never written.
    #[cfg(feature = "http")]
    pub fn from_config(config: &Config) -> Result<Self> {
        let local: StoreHandle =
            Arc::new(LocalBackend::new("local", &config.storage.path).or_raise(|| ErrorKind::Storage)?);
        let store: StoreHandle = match config.storage.read_only {
            true => Arc::new(ReadOnlyBackend::new(local)),
            false => local,
        };
        let provider = HttpProvider::new(config.provider.endpoints.clone(), config.cache.fetch_timeout())
            .or_raise(|| ErrorKind::Provider)?;
        Ok(Self::new(store, Arc::new(provider), config))
    }

    /// Replace the distributor, keeping everything else.
    pub fn with_distributor(self, distributor: SequentialDistributor) -> Self {
        Self { distributor, ..self }
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Exactly `count` verses.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::BatchTooLarge`] if `count` is zero or exceeds the
    /// universe. Nothing else fails; unresolved slots are filled by the
    /// fallback chain.
    #[tracing::instrument(skip(self))]
    pub async fn get_next_batch(&self, count: usize) -> Result<Vec<BatchVerse>> {
        let references = match self.distributor.next(count).await {
            Ok(references) => references,
            Err(err) => {
                let kind = match *err {
                    lectio_distribute::error::ErrorKind::BatchTooLarge { requested, universe } => {
                        ErrorKind::BatchTooLarge { requested, universe }
                    },
                    lectio_distribute::error::ErrorKind::StorageCorrupted(_) => ErrorKind::Storage,
                };
                return Err(err.raise(kind));
            },
        };

        let resolutions =
            join_all(references.iter().map(|reference| self.cache.resolve(reference, &self.version))).await;

        let mut resolved = Vec::with_capacity(references.len());
        for (reference, resolution) in references.into_iter().zip(resolutions) {
            match resolution {
                Ok(passage) => resolved.push(Some(BatchVerse {
                    reference,
                    text: passage.text,
                    source: VerseSource::Resolved(passage.source),
                })),
                Err(err) => {
                    tracing::warn!(%reference, error = ?err, "Falling back for unresolved reference");
                    resolved.push(None);
                },
            }
        }

        // One call for every failed slot, so fallbacks never repeat a verse
        // already in the batch.
        let failed = resolved.iter().filter(|slot| slot.is_none()).count();
        let mut emergency = if failed == 0 {
            Vec::new().into_iter()
        } else {
            let served: HashSet<VerseReference> = resolved.iter().flatten().map(|verse| verse.reference).collect();
            self.fallback.get_emergency_verses_excluding(failed, &served).await.into_iter()
        };
        let batch = resolved
            .into_iter()
            .map(|slot| match slot {
                Some(verse) => verse,
                None => {
                    let verse = emergency.next().unwrap_or_else(failsafe_verse);
                    BatchVerse {
                        reference: verse.reference,
                        text: verse.text,
                        source: VerseSource::Fallback(verse.tier),
                    }
                },
            })
            .collect();
        Ok(batch)
    }

    pub async fn get_stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.cache.stats().await,
            distribution: self.distributor.stats().await,
        }
    }

    /// Discard distribution progress and start a fresh first cycle.
    pub async fn reset_distribution(&self) -> DistributionStats {
        self.distributor.reset().await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await.or_raise(|| ErrorKind::Storage)
    }

    #[tracing::instrument(skip(self))]
    pub async fn health(&self) -> HealthReport {
        let (reference, _) = failsafe();
        let online = matches!(
            tokio::time::timeout(self.fetch_timeout(), self.provider.fetch(&reference, &self.version)).await,
            Ok(Ok(_))
        );
        let store_reachable = match self.store.get(&self.state_key).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(store = self.store.name(), error = ?err, "Store unreachable");
                false
            },
        };
        let report = HealthReport::new(
            online,
            store_reachable,
            self.cache.is_readable().await,
            !self.fallback.offline_table().is_empty(),
            !self.fallback.hardcoded_table().is_empty(),
        );
        tracing::info!(healthy = report.is_healthy(), online, store_reachable, "Health check complete");
        report
    }

    /// Rebuild the cache: clear it, then preload the popular verses.
    #[tracing::instrument(skip(self))]
    pub async fn repair(&self) -> RepairReport {
        let cache_cleared = match self.cache.clear().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to clear verse cache during repair");
                false
            },
        };
        let references = popular_references();
        let preloaded = self.cache.preload(references, &self.version).await;
        RepairReport {
            cache_cleared,
            preloaded,
            requested: references.len(),
        }
    }

    fn fetch_timeout(&self) -> Duration {
        self.cache.settings().fetch_timeout
    }

}

fn failsafe_verse() -> EmergencyVerse {
    let (reference, text) = failsafe();
    EmergencyVerse {
        reference,
        text: text.to_string(),
        tier: FallbackTier::Failsafe,
    }
}
