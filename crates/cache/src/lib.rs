//! Bounded, expiring cache of resolved verse text.
//!
//! [`TextResolutionCache`] sits in front of a [`TextProvider`](provider::TextProvider)
//! and remembers what it fetched in the key-value store. Entries expire after
//! a fixed time-to-live and the oldest are evicted once the cache grows past
//! its bound.
//!
//! # Features
//! - `http`: the reqwest-backed [`HttpProvider`](provider::HttpProvider).
//! - `mock`: the in-memory [`MockProvider`](provider::MockProvider) for tests.

mod cache;
pub mod error;
mod models;
pub mod provider;

pub use crate::cache::{CacheSettings, DEFAULT_CACHE_KEY, TextResolutionCache};
pub use crate::models::{CacheKey, CacheStats};
