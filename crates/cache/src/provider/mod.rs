//! Text providers.
//!
//! A [`TextProvider`] turns a reference into displayable text, typically
//! over the network. Providers may try several upstream endpoints
//! internally; callers only see the final outcome.

mod endpoint;
pub mod error;
mod format;
#[cfg(feature = "http")]
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::endpoint::Endpoint;
pub use self::error::{Error, ErrorKind, Result};
pub use self::format::ResponseFormat;
#[cfg(feature = "http")]
pub use self::http::HttpProvider;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockProvider;
use async_trait::async_trait;
use lectio_canon::VerseReference;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn TextProvider + Send + Sync>;

/// Text obtained from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub text: String,
    /// Label of the upstream that produced the text.
    pub source: String,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Name of the provider (used for logging only).
    fn name(&self) -> &str;

    /// Fetch the text of `reference` in translation `version`.
    async fn fetch(&self, reference: &VerseReference, version: &str) -> Result<Passage>;
}
