//! Persisted key-value storage.
//!
//! Everything lectio remembers between runs (the distribution permutation and
//! the resolved text cache) lives behind the [`KeyValueStore`] trait. Values
//! are opaque strings; the [`json`] module layers typed records on top.

pub mod backend;
pub mod error;
pub mod json;
mod key;

pub use crate::backend::KeyValueStore;
pub use crate::key::{MAX_KEY_LENGTH, validate as validate_key};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn KeyValueStore + Send + Sync>;
