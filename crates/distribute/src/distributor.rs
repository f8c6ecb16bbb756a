use crate::error::{ErrorKind, Result};
use crate::state::{DistributionState, DistributionStats, StateRecord};
use lectio_canon::VerseReference;
use lectio_storage::StoreHandle;
use lectio_storage::json::{self, Loaded};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use time::UtcDateTime;
use tokio::sync::Mutex;

/// Store key used when none is configured.
pub const DEFAULT_STATE_KEY: &str = "sequential_verse_system";

struct Inner {
    /// Last known state; used when the store cannot be read.
    state: Option<DistributionState>,
    /// The last write failed, so the store lags behind `state`.
    dirty: bool,
    rng: StdRng,
}

/// Serves the universe in fixed-size batches, each reference exactly once
/// per cycle, across calls and process restarts.
///
/// State is persisted in the configured store after every change. Store
/// failures never surface: an unreadable store falls back to the last
/// in-memory state (or a fresh one), and a failed write is logged and
/// retried implicitly on the next call.
///
/// # Examples
///
/// ```
/// use lectio_distribute::SequentialDistributor;
/// use lectio_storage::{StoreHandle, backend::LocalBackend};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = std::env::temp_dir().join("lectio-distribute-doctest");
/// let store: StoreHandle = Arc::new(LocalBackend::new("local", &dir)?);
/// let distributor = SequentialDistributor::new(store);
/// let batch = distributor.next(2).await?;
/// assert_eq!(batch.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct SequentialDistributor {
    store: StoreHandle,
    key: String,
    universe: Arc<[VerseReference]>,
    inner: Mutex<Inner>,
}

impl SequentialDistributor {
    /// Distributor over the full canonical universe, persisted under
    /// [`DEFAULT_STATE_KEY`].
    pub fn new(store: StoreHandle) -> Self {
        Self::with_universe(store, lectio_canon::universe().into())
    }

    /// Distributor over an arbitrary universe.
    ///
    /// Panics if the universe is empty or has more than `u32::MAX` items.
    pub fn with_universe(store: StoreHandle, universe: Arc<[VerseReference]>) -> Self {
        assert!(!universe.is_empty(), "cannot distribute an empty universe");
        assert!(u32::try_from(universe.len()).is_ok(), "universe too large to index");
        Self {
            store,
            key: DEFAULT_STATE_KEY.to_string(),
            universe,
            inner: Mutex::new(Inner {
                state: None,
                dirty: false,
                rng: StdRng::from_entropy(),
            }),
        }
    }

    /// Persist state under a different store key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a deterministic shuffle.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: None,
                dirty: false,
                rng: StdRng::seed_from_u64(seed),
            }),
            ..self
        }
    }

    /// Number of references in one cycle.
    pub fn universe_size(&self) -> usize {
        self.universe.len()
    }

    /// Load persisted state, creating and persisting a fresh cycle if there
    /// is none or it cannot be used.
    #[tracing::instrument(level = "debug", skip(self), fields(store = self.store.name()))]
    pub async fn initialize(&self) -> DistributionStats {
        let mut inner = self.inner.lock().await;
        let (state, created) = self.load_or_create(&mut inner).await;
        if created {
            inner.dirty = !self.persist(&state).await;
        }
        let stats = DistributionStats::from(&state);
        inner.state = Some(state);
        stats
    }

    /// Serve the next `batch_size` references.
    ///
    /// When fewer than `batch_size` references remain in the current cycle,
    /// a new cycle is shuffled first and the batch is served from it.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::BatchTooLarge`] if `batch_size` is zero or exceeds the
    /// universe size. Nothing else is ever returned.
    #[tracing::instrument(level = "debug", skip(self), fields(store = self.store.name()))]
    pub async fn next(&self, batch_size: usize) -> Result<Vec<VerseReference>> {
        if batch_size == 0 || batch_size > self.universe.len() {
            exn::bail!(ErrorKind::BatchTooLarge {
                requested: batch_size,
                universe: self.universe.len(),
            });
        }
        let mut inner = self.inner.lock().await;
        let (mut state, _) = self.load_or_create(&mut inner).await;
        if state.cursor + batch_size > state.permutation.len() {
            self.begin_next_cycle(&mut state, &mut inner.rng);
        }
        let start = state.cursor;
        let batch: Vec<VerseReference> = state.permutation[start..start + batch_size]
            .iter()
            .map(|&index| self.universe[index as usize])
            .collect();
        state.cursor += batch_size;
        tracing::debug!(cursor = state.cursor, cycle = state.cycle_count, "Advanced distribution cursor");
        inner.dirty = !self.persist(&state).await;
        inner.state = Some(state);
        Ok(batch)
    }

    /// Discard persisted state and start again from cycle one.
    #[tracing::instrument(skip(self), fields(store = self.store.name()))]
    pub async fn reset(&self) -> DistributionStats {
        let mut inner = self.inner.lock().await;
        if let Err(err) = self.store.remove(&self.key).await {
            tracing::warn!(error = ?err, "Unable to remove persisted distribution state");
        }
        let state = Self::fresh_state(self.universe.len(), &mut inner.rng);
        inner.dirty = !self.persist(&state).await;
        tracing::info!("Distribution reset to a fresh cycle");
        let stats = DistributionStats::from(&state);
        inner.state = Some(state);
        stats
    }

    /// Current position within the current cycle.
    pub async fn stats(&self) -> DistributionStats {
        let mut inner = self.inner.lock().await;
        let (state, created) = self.load_or_create(&mut inner).await;
        if created {
            inner.dirty = !self.persist(&state).await;
        }
        let stats = DistributionStats::from(&state);
        inner.state = Some(state);
        stats
    }

    /// Re-read the persisted state before every mutation, unless the store
    /// is known to lag behind the in-memory copy.
    async fn load_or_create(&self, inner: &mut Inner) -> (DistributionState, bool) {
        if inner.dirty
            && let Some(state) = inner.state.take()
        {
            return (state, false);
        }
        match json::load::<StateRecord>(&*self.store, &self.key).await {
            Ok(Loaded::Present(record)) => match record.into_state(self.universe.len()) {
                Ok(state) => return (state, false),
                Err(err) => tracing::warn!(error = ?err, "Discarding persisted distribution state"),
            },
            Ok(Loaded::Corrupted(reason)) => {
                let err = exn::Exn::from(ErrorKind::StorageCorrupted(reason));
                tracing::warn!(error = ?err, "Discarding unparsable distribution state");
            },
            Ok(Loaded::Absent) => {
                if let Some(state) = inner.state.take() {
                    return (state, false);
                }
            },
            Err(err) => {
                tracing::warn!(error = ?err, "Distribution store unavailable; using in-memory state");
                if let Some(state) = inner.state.take() {
                    return (state, false);
                }
            },
        }
        tracing::info!(universe = self.universe.len(), "Starting a new distribution");
        (Self::fresh_state(self.universe.len(), &mut inner.rng), true)
    }

    fn fresh_state(universe_size: usize, rng: &mut StdRng) -> DistributionState {
        let now = UtcDateTime::now();
        DistributionState {
            permutation: Self::shuffled(universe_size, rng),
            cursor: 0,
            cycle_count: 1,
            created_at: now,
            last_reset_at: now,
        }
    }

    fn begin_next_cycle(&self, state: &mut DistributionState, rng: &mut StdRng) {
        state.permutation = Self::shuffled(self.universe.len(), rng);
        state.cursor = 0;
        state.cycle_count += 1;
        state.last_reset_at = UtcDateTime::now();
        tracing::info!(cycle = state.cycle_count, "Universe fully served; reshuffled for a new cycle");
    }

    fn shuffled(universe_size: usize, rng: &mut StdRng) -> Vec<u32> {
        // Bounded by the assertion in the constructor.
        let mut permutation: Vec<u32> = (0..universe_size as u32).collect();
        permutation.shuffle(rng);
        permutation
    }

    /// Returns whether the state reached the store.
    async fn persist(&self, state: &DistributionState) -> bool {
        match json::save(&*self.store, &self.key, &StateRecord::from(state)).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to persist distribution state; keeping it in memory");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_canon::Book;
    use lectio_storage::KeyValueStore;
    use lectio_storage::backend::MockBackend;
    use std::collections::HashSet;

    /// The four-reference universe `{A, B, C, D}`.
    fn small_universe() -> Arc<[VerseReference]> {
        let john = Book::lookup("John").unwrap();
        (1..=4).map(|verse| VerseReference::new(john, 3, verse).unwrap()).collect()
    }

    fn distributor(store: &Arc<MockBackend>, universe: Arc<[VerseReference]>) -> SequentialDistributor {
        SequentialDistributor::with_universe(store.clone(), universe).with_seed(7)
    }

    #[tokio::test]
    async fn test_small_universe_cycles() {
        let store = Arc::new(MockBackend::default());
        let universe = small_universe();
        let distributor = distributor(&store, universe.clone());
        let all: HashSet<_> = universe.iter().copied().collect();

        let first = distributor.next(2).await.unwrap();
        let second = distributor.next(2).await.unwrap();
        let served: HashSet<_> = first.iter().chain(&second).copied().collect();
        assert_eq!(served, all);
        assert_eq!(distributor.stats().await.cycle_count, 1);
        assert_eq!(distributor.stats().await.remaining, 0);

        let third = distributor.next(2).await.unwrap();
        assert_eq!(third.len(), 2);
        assert_ne!(third[0], third[1]);
        let stats = distributor.stats().await;
        assert_eq!((stats.cycle_count, stats.cursor), (2, 2));
    }

    #[tokio::test]
    async fn test_full_coverage_before_repeat() {
        let store = Arc::new(MockBackend::default());
        let john = Book::lookup("John").unwrap();
        let universe: Arc<[VerseReference]> =
            (1..=john.verse_count(3).unwrap()).map(|v| VerseReference::new(john, 3, v).unwrap()).collect();
        let distributor = distributor(&store, universe.clone());

        let batch = 3;
        let mut served = Vec::new();
        for _ in 0..universe.len() / batch {
            served.extend(distributor.next(batch).await.unwrap());
        }
        let mut expected = universe.to_vec();
        served.sort();
        expected.sort();
        assert_eq!(served, expected);

        // The following cycle again yields no repeats.
        let mut next_cycle = HashSet::new();
        for _ in 0..universe.len() / batch {
            for reference in distributor.next(batch).await.unwrap() {
                assert!(next_cycle.insert(reference), "{reference} served twice in one cycle");
            }
        }
        assert_eq!(distributor.stats().await.cycle_count, 2);
    }

    #[tokio::test]
    async fn test_cycle_reset_when_batch_does_not_fit() {
        let store = Arc::new(MockBackend::default());
        let distributor = distributor(&store, small_universe());
        distributor.next(3).await.unwrap();
        let created_at = distributor.stats().await.created_at;
        // Only one reference left: the batch comes from a new cycle instead.
        let batch = distributor.next(3).await.unwrap();
        assert_eq!(batch.iter().collect::<HashSet<_>>().len(), 3);
        let stats = distributor.stats().await;
        assert_eq!((stats.cycle_count, stats.cursor), (2, 3));
        assert_eq!(stats.created_at, created_at);
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let store = Arc::new(MockBackend::default());
        let universe = small_universe();
        let first = distributor(&store, universe.clone()).next(2).await.unwrap();
        // A new instance (different seed) must resume the persisted cycle.
        let resumed = SequentialDistributor::with_universe(store.clone(), universe.clone()).with_seed(99);
        let second = resumed.next(2).await.unwrap();
        let served: HashSet<_> = first.iter().chain(&second).copied().collect();
        assert_eq!(served.len(), 4);
        assert_eq!(resumed.stats().await.cycle_count, 1);
    }

    #[rstest::rstest]
    #[case(0)]
    #[case(5)]
    #[tokio::test]
    async fn test_batch_too_large(#[case] requested: usize) {
        let store = Arc::new(MockBackend::default());
        let err = distributor(&store, small_universe()).next(requested).await.unwrap_err();
        assert_eq!(*err, ErrorKind::BatchTooLarge { requested, universe: 4 });
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_corrupted_state_is_regenerated() {
        let store = Arc::new(MockBackend::with_entries([(DEFAULT_STATE_KEY, "{definitely not json")]));
        let distributor = distributor(&store, small_universe());
        assert_eq!(distributor.next(2).await.unwrap().len(), 2);
        let stats = distributor.stats().await;
        assert_eq!((stats.cycle_count, stats.cursor), (1, 2));
        let raw = store.get(DEFAULT_STATE_KEY).await.unwrap().unwrap();
        assert!(raw.contains(r#""schema":1"#));
    }

    #[tokio::test]
    async fn test_state_for_other_universe_is_regenerated() {
        let store = Arc::new(MockBackend::default());
        distributor(&store, small_universe()).next(2).await.unwrap();
        let larger: Arc<[VerseReference]> = lectio_canon::universe()[..10].into();
        let distributor = distributor(&store, larger);
        let stats = distributor.initialize().await;
        assert_eq!((stats.total, stats.cursor), (10, 0));
    }

    #[tokio::test]
    async fn test_unavailable_store_keeps_serving() {
        let store = Arc::new(MockBackend::unavailable());
        let universe = small_universe();
        let distributor = distributor(&store, universe.clone());
        let first = distributor.next(2).await.unwrap();
        let second = distributor.next(2).await.unwrap();
        let served: HashSet<_> = first.iter().chain(&second).copied().collect();
        assert_eq!(served.len(), 4);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_store_recovers_after_outage() {
        let store = Arc::new(MockBackend::default());
        let distributor = distributor(&store, small_universe());
        distributor.next(1).await.unwrap();
        store.set_unavailable(true);
        distributor.next(1).await.unwrap();
        store.set_unavailable(false);
        distributor.next(1).await.unwrap();
        assert_eq!(distributor.stats().await.cursor, 3);
    }

    #[tokio::test]
    async fn test_reset() {
        let store = Arc::new(MockBackend::default());
        let distributor = distributor(&store, small_universe());
        for _ in 0..3 {
            distributor.next(2).await.unwrap();
        }
        assert_eq!(distributor.stats().await.cycle_count, 2);
        let stats = distributor.reset().await;
        assert_eq!((stats.cycle_count, stats.cursor, stats.remaining), (1, 0, 4));
        assert!(store.contains(DEFAULT_STATE_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_initialize_persists_immediately() {
        let store = Arc::new(MockBackend::default());
        let stats = distributor(&store, small_universe()).with_key("custom_state").initialize().await;
        assert_eq!((stats.total, stats.cursor, stats.cycle_count), (4, 0, 1));
        assert!(store.contains("custom_state").await.unwrap());
        assert!(!store.contains(DEFAULT_STATE_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_canonical_universe() {
        let store = Arc::new(MockBackend::default());
        let distributor = SequentialDistributor::new(store).with_seed(1);
        assert_eq!(distributor.universe_size(), 31_102);
        let batch = distributor.next(2).await.unwrap();
        assert_ne!(batch[0], batch[1]);
    }
}
