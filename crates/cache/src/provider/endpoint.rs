use super::error::{ErrorKind, Result};
use super::format::ResponseFormat;
use lectio_canon::VerseReference;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

const PLACEHOLDERS: [&str; 6] = ["reference", "book", "book_id", "chapter", "verses", "version"];

/// Substituted into templates to check that they expand to a usable URL.
static SAMPLE: LazyLock<VerseReference> = LazyLock::new(|| "1 John 4:7-8".parse().unwrap());

/// One upstream text source.
///
/// The URL is a template; these placeholders are substituted per request:
///
/// | Placeholder   | `1 John 4:7-8` in `KJV` |
/// |---------------|-------------------------|
/// | `{reference}` | `1%20John%204%3A7-8`    |
/// | `{book}`      | `1%20John`              |
/// | `{book_id}`   | `1john`                 |
/// | `{chapter}`   | `4`                     |
/// | `{verses}`    | `7-8`                   |
/// | `{version}`   | `kjv`                   |
///
/// Substituted values are percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    pub format: ResponseFormat,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>, format: ResponseFormat) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            format,
        }
    }

    /// Check that the template is an http(s) URL using only known placeholders.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            exn::bail!(self.invalid("name is empty"));
        }
        let mut remaining = self.url.as_str();
        while let Some(open) = remaining.find('{') {
            let after = &remaining[open + 1..];
            let Some(close) = after.find('}') else {
                exn::bail!(self.invalid("unclosed placeholder"));
            };
            if !PLACEHOLDERS.contains(&&after[..close]) {
                exn::bail!(self.invalid(&format!("unknown placeholder {{{}}}", &after[..close])));
            }
            remaining = &after[close + 1..];
        }
        if remaining.contains('}') {
            exn::bail!(self.invalid("unopened placeholder"));
        }
        let url = self.url_for(&SAMPLE, "KJV")?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
            exn::bail!(self.invalid("url must be an absolute http(s) url"));
        }
        Ok(())
    }

    /// The request URL for `reference` in `version`.
    pub fn url_for(&self, reference: &VerseReference, version: &str) -> Result<Url> {
        let expanded = self
            .url
            .replace("{reference}", &urlencoding::encode(&reference.to_string()))
            .replace("{book_id}", &urlencoding::encode(&reference.book().id()))
            .replace("{book}", &urlencoding::encode(reference.book().name()))
            .replace("{chapter}", &reference.chapter().to_string())
            .replace("{verses}", &urlencoding::encode(&reference.verse_label()))
            .replace("{version}", &urlencoding::encode(&version.to_lowercase()));
        Url::parse(&expanded).map_err(|err| exn::Exn::from(self.invalid(&err.to_string())))
    }

    fn invalid(&self, reason: &str) -> ErrorKind {
        ErrorKind::InvalidEndpoint(format!("{}: {reason}", self.name))
    }
}
