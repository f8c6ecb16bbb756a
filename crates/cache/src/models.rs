use lectio_canon::VerseReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use time::UtcDateTime;

/// Version of the persisted cache layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Identity of a cached text: a reference in one translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    reference: VerseReference,
    version: String,
}

impl CacheKey {
    /// Translation names are compared case-insensitively.
    pub fn new(reference: VerseReference, version: &str) -> Self {
        Self {
            reference,
            version: version.trim().to_uppercase(),
        }
    }

    pub fn reference(&self) -> &VerseReference {
        &self.reference
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.reference, self.version)
    }
}

/// One cached text, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EntryRecord {
    pub text: String,
    /// Unix timestamp (seconds) of the successful fetch.
    pub fetched_at: i64,
    pub source: String,
}

impl EntryRecord {
    /// Entries with an unreadable timestamp count as expired.
    pub fn is_expired(&self, now: UtcDateTime, ttl: Duration) -> bool {
        match UtcDateTime::from_unix_timestamp(self.fetched_at) {
            Ok(fetched_at) => now - fetched_at >= ttl,
            Err(_) => true,
        }
    }
}

/// The whole cache, as persisted under a single store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CacheRecord {
    pub schema: u32,
    /// Keyed by the [`CacheKey`] display form.
    pub entries: BTreeMap<String, EntryRecord>,
}

impl Default for CacheRecord {
    fn default() -> Self {
        Self {
            schema: SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl CacheRecord {
    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self, now: UtcDateTime, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - self.entries.len()
    }

    /// Drop the oldest entries until at most `max_entries` remain, never
    /// evicting `keep`. Returns how many were removed.
    pub fn evict_oldest(&mut self, max_entries: usize, keep: Option<&str>) -> usize {
        let excess = self.entries.len().saturating_sub(max_entries);
        if excess == 0 {
            return 0;
        }
        let mut by_age: Vec<(i64, String)> = self
            .entries
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != keep)
            .map(|(key, entry)| (entry.fetched_at, key.clone()))
            .collect();
        by_age.sort();
        let mut evicted = 0;
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
            evicted += 1;
        }
        evicted
    }
}

/// Diagnostic snapshot of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries physically stored, including expired ones not yet purged.
    pub entry_count: usize,
    /// Entries that would still be served.
    pub live_count: usize,
    /// Size of the persisted record.
    pub approx_size_bytes: usize,
    pub max_entries: usize,
    pub ttl_days: u64,
}
