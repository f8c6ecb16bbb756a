//! In-memory text provider for testing.

use super::error::{ErrorKind, Result};
use super::{Passage, TextProvider};
use async_trait::async_trait;
use lectio_canon::VerseReference;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory text provider for testing.
///
/// Answers from a fixed table (or with one constant text for every
/// reference), counts every call, and can be switched into a failing mode
/// where every fetch reports a network error.
pub struct MockProvider {
    name: String,
    texts: HashMap<VerseReference, String>,
    constant: Option<String>,
    delay: Option<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockProvider {
    /// A provider that knows the given references.
    ///
    /// Panics if any reference fails to parse. If test setup is wrong, then
    /// the test should not pass.
    pub fn with_texts<'a>(texts: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let texts = texts
            .into_iter()
            .map(|(reference, text)| match reference.parse::<VerseReference>() {
                Ok(parsed) => (parsed, text.to_string()),
                Err(_) => panic!("MockProvider::with_texts: invalid reference {reference:?}"),
            })
            .collect();
        Self {
            name: "mock".to_string(),
            texts,
            constant: None,
            delay: None,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that answers every reference with `text`.
    pub fn constant(text: impl Into<String>) -> Self {
        let texts: [(&str, &str); 0] = [];
        Self {
            constant: Some(text.into()),
            ..Self::with_texts(texts)
        }
    }

    /// A provider on which every fetch fails.
    pub fn failing() -> Self {
        let texts: [(&str, &str); 0] = [];
        let provider = Self::with_texts(texts);
        provider.set_failing(true);
        provider
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Wait this long before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, reference: &VerseReference, _version: &str) -> Result<Passage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Network(format!("{} is offline", self.name)));
        }
        let text = self.texts.get(reference).or(self.constant.as_ref());
        match text {
            Some(text) => Ok(Passage {
                text: text.clone(),
                source: self.name.clone(),
            }),
            None => exn::bail!(ErrorKind::Status(404)),
        }
    }
}
