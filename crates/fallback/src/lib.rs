//! Emergency verses.
//!
//! When a reference cannot be resolved, the [`FallbackChain`] supplies a
//! replacement from progressively more offline sources, down to a single
//! constant verse that cannot fail.

mod chain;
pub mod error;
mod table;
mod tier;

pub use crate::chain::{EmergencyVerse, FallbackChain};
pub use crate::table::{BUNDLED_VERSION, StaticVerseTable, failsafe, popular_references};
pub use crate::tier::FallbackTier;
