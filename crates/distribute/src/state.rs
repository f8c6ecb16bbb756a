use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Version of the persisted record layout. Records with any other value are
/// discarded and regenerated.
pub const SCHEMA_VERSION: u32 = 1;

/// In-memory distribution state.
///
/// The permutation holds indices into the universe the distributor was built
/// with, which keeps the persisted record compact and lets a reader detect a
/// record written against a different universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DistributionState {
    pub permutation: Vec<u32>,
    pub cursor: usize,
    pub cycle_count: u64,
    pub created_at: UtcDateTime,
    pub last_reset_at: UtcDateTime,
}

impl DistributionState {
    pub fn remaining(&self) -> usize {
        self.permutation.len() - self.cursor
    }
}

/// Persisted form of [`DistributionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StateRecord {
    pub schema: u32,
    pub universe_size: usize,
    pub permutation: Vec<u32>,
    pub cursor: usize,
    pub cycle_count: u64,
    pub created_at: i64,
    pub last_reset_at: i64,
}

impl From<&DistributionState> for StateRecord {
    fn from(state: &DistributionState) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            universe_size: state.permutation.len(),
            permutation: state.permutation.clone(),
            cursor: state.cursor,
            cycle_count: state.cycle_count,
            created_at: state.created_at.unix_timestamp(),
            last_reset_at: state.last_reset_at.unix_timestamp(),
        }
    }
}

impl StateRecord {
    /// Validate a loaded record against the universe currently in use.
    pub fn into_state(self, universe_size: usize) -> Result<DistributionState> {
        let corrupted = |reason: &str| exn::Exn::from(ErrorKind::StorageCorrupted(reason.to_string()));
        if self.schema != SCHEMA_VERSION {
            return Err(corrupted("unknown schema version"));
        }
        if self.universe_size != universe_size || self.permutation.len() != universe_size {
            return Err(corrupted("universe size mismatch"));
        }
        if self.cursor > self.permutation.len() {
            return Err(corrupted("cursor beyond end of permutation"));
        }
        if self.cycle_count == 0 {
            return Err(corrupted("cycle count must start at one"));
        }
        let mut seen = vec![false; universe_size];
        for &index in &self.permutation {
            match seen.get_mut(index as usize) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(corrupted("duplicate index in permutation")),
                None => return Err(corrupted("index out of range in permutation")),
            }
        }
        Ok(DistributionState {
            permutation: self.permutation,
            cursor: self.cursor,
            cycle_count: self.cycle_count,
            created_at: UtcDateTime::from_unix_timestamp(self.created_at)
                .or_raise(|| ErrorKind::StorageCorrupted("creation date".to_string()))?,
            last_reset_at: UtcDateTime::from_unix_timestamp(self.last_reset_at)
                .or_raise(|| ErrorKind::StorageCorrupted("last reset date".to_string()))?,
        })
    }
}

/// Diagnostic snapshot of the distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionStats {
    /// Size of the universe (one cycle).
    pub total: usize,
    /// Position of the next reference to serve within the current cycle.
    pub cursor: usize,
    /// References served so far in the current cycle.
    pub used: usize,
    pub remaining: usize,
    pub cycle_count: u64,
    /// Share of the current cycle already served, `0.0..=100.0`.
    pub progress_percent: f64,
    pub created_at: UtcDateTime,
    pub last_reset_at: UtcDateTime,
}

impl From<&DistributionState> for DistributionStats {
    fn from(state: &DistributionState) -> Self {
        let total = state.permutation.len();
        let progress_percent = if total == 0 { 0.0 } else { state.cursor as f64 * 100.0 / total as f64 };
        Self {
            total,
            cursor: state.cursor,
            used: state.cursor,
            remaining: state.remaining(),
            cycle_count: state.cycle_count,
            progress_percent,
            created_at: state.created_at,
            last_reset_at: state.last_reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> StateRecord {
        StateRecord {
            schema: SCHEMA_VERSION,
            universe_size: 4,
            permutation: vec![2, 0, 3, 1],
            cursor: 2,
            cycle_count: 1,
            created_at: 1_700_000_000,
            last_reset_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_record_round_trip() {
        let state = record().into_state(4).unwrap();
        assert_eq!(state.remaining(), 2);
        assert_eq!(StateRecord::from(&state), record());
    }

    #[rstest]
    #[case::schema(StateRecord { schema: 2, ..record() })]
    #[case::size(StateRecord { universe_size: 5, ..record() })]
    #[case::short(StateRecord { permutation: vec![0, 1, 2], ..record() })]
    #[case::cursor(StateRecord { cursor: 5, ..record() })]
    #[case::cycle(StateRecord { cycle_count: 0, ..record() })]
    #[case::duplicate(StateRecord { permutation: vec![0, 0, 1, 2], ..record() })]
    #[case::out_of_range(StateRecord { permutation: vec![0, 1, 2, 4], ..record() })]
    #[case::timestamp(StateRecord { created_at: i64::MAX, ..record() })]
    fn test_invalid_records(#[case] record: StateRecord) {
        let err = record.into_state(4).unwrap_err();
        assert!(matches!(&*err, ErrorKind::StorageCorrupted(_)));
    }

    #[test]
    fn test_record_json_layout() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["schema"], 1);
        assert_eq!(json["permutation"], serde_json::json!([2, 0, 3, 1]));
        assert_eq!(json["cycle_count"], 1);
    }

    #[test]
    fn test_stats() {
        let stats = DistributionStats::from(&record().into_state(4).unwrap());
        assert_eq!((stats.total, stats.used, stats.remaining, stats.cycle_count), (4, 2, 2, 1));
        assert_eq!(stats.progress_percent, 50.0);
    }
}
