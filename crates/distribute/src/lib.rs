//! Full-coverage distribution of verse references.
//!
//! The [`SequentialDistributor`] keeps a persisted random permutation of the
//! reference universe and a cursor into it. Every reference is served exactly
//! once before any reference is served again; when a cycle runs out the
//! universe is reshuffled.

mod distributor;
pub mod error;
mod state;

pub use crate::distributor::{DEFAULT_STATE_KEY, SequentialDistributor};
pub use crate::state::{DistributionStats, SCHEMA_VERSION};
