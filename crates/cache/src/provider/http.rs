//! HTTP text provider.

use super::error::{Error, ErrorKind, Result};
use super::{Endpoint, Passage, TextProvider};
use async_trait::async_trait;
use exn::ResultExt;
use lectio_canon::VerseReference;
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Fetches text over HTTP from an ordered list of endpoints.
///
/// Endpoints are tried in order; the first one that yields text wins. Each
/// request is bounded by the timeout given at construction.
///
/// # Examples
///
/// ```no_run
/// use lectio_cache::provider::{Endpoint, HttpProvider, ResponseFormat, TextProvider};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = HttpProvider::new(
///     vec![Endpoint::new(
///         "bible-api",
///         "https://bible-api.com/{reference}?translation={version}",
///         ResponseFormat::Passage,
///     )],
///     Duration::from_secs(10),
/// )?;
/// let passage = provider.fetch(&"John 3:16".parse()?, "KJV").await?;
/// println!("{} ({})", passage.text, passage.source);
/// # Ok(())
/// # }
/// ```
pub struct HttpProvider {
    client: reqwest::Client,
    endpoints: Vec<Endpoint>,
}

impl HttpProvider {
    /// # Errors
    ///
    /// If no endpoints are given, any endpoint fails validation, or the HTTP
    /// client cannot be constructed.
    pub fn new(endpoints: Vec<Endpoint>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            exn::bail!(ErrorKind::NoEndpoints);
        }
        for endpoint in &endpoints {
            endpoint.validate()?;
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lectio/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Network("unable to build HTTP client".to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    async fn fetch_from(&self, endpoint: &Endpoint, reference: &VerseReference, version: &str) -> Result<String> {
        let url = endpoint.url_for(reference, version)?;
        let response = self.client.get(url).header(ACCEPT, "application/json").send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = response.text().await.map_err(classify)?;
        endpoint.format.parse(&body, reference)
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return exn::Exn::from(ErrorKind::Timeout);
    }
    exn::Exn::from(ErrorKind::Network(err.to_string()))
}

#[async_trait]
impl TextProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, reference: &VerseReference, version: &str) -> Result<Passage> {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            match self.fetch_from(endpoint, reference, version).await {
                Ok(text) => {
                    tracing::debug!(endpoint = %endpoint.name, %reference, "Fetched verse text");
                    return Ok(Passage {
                        text,
                        source: endpoint.name.clone(),
                    });
                },
                Err(err) => {
                    tracing::debug!(endpoint = %endpoint.name, %reference, error = ?err, "Endpoint failed");
                    last_error = Some(err);
                },
            }
        }
        // Constructor guarantees at least one endpoint.
        Err(last_error.unwrap_or_else(|| exn::Exn::from(ErrorKind::NoEndpoints)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ResponseFormat;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn john_3_16() -> VerseReference {
        "John 3:16".parse().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_passage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/john/3/16"))
            .and(query_param("translation", "kjv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"text":"For God so loved the world\n"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let endpoint = Endpoint::new(
            "primary",
            format!("{}/{{book_id}}/{{chapter}}/{{verses}}?translation={{version}}", server.uri()),
            ResponseFormat::Passage,
        );
        let provider = HttpProvider::new(vec![endpoint], Duration::from_secs(5)).unwrap();
        let passage = provider.fetch(&john_3_16(), "KJV").await.unwrap();
        assert_eq!(passage.text, "For God so loved the world");
        assert_eq!(passage.source, "primary");
    }

    #[tokio::test]
    async fn test_falls_through_to_next_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down/john/3"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chapters/john/3.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"15":"a","16":"For God so loved","17":"c"}"#))
            .mount(&server)
            .await;
        let provider = HttpProvider::new(
            vec![
                Endpoint::new("down", format!("{}/down/{{book_id}}/{{chapter}}", server.uri()), ResponseFormat::VerseList),
                Endpoint::new(
                    "chapters",
                    format!("{}/chapters/{{book_id}}/{{chapter}}.json", server.uri()),
                    ResponseFormat::ChapterMap,
                ),
            ],
            Duration::from_secs(5),
        )
        .unwrap();
        let passage = provider.fetch(&john_3_16(), "KJV").await.unwrap();
        assert_eq!(passage.text, "For God so loved");
        assert_eq!(passage.source, "chapters");
    }

    #[tokio::test]
    async fn test_all_endpoints_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let provider = HttpProvider::new(
            vec![Endpoint::new("missing", format!("{}/{{book_id}}", server.uri()), ResponseFormat::Passage)],
            Duration::from_secs(5),
        )
        .unwrap();
        let err = provider.fetch(&john_3_16(), "KJV").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Status(404));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;
        let provider = HttpProvider::new(
            vec![Endpoint::new("html", format!("{}/{{book_id}}", server.uri()), ResponseFormat::Passage)],
            Duration::from_secs(5),
        )
        .unwrap();
        let err = provider.fetch(&john_3_16(), "KJV").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Format("passage"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"text":"late"}"#)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let provider = HttpProvider::new(
            vec![Endpoint::new("slow", format!("{}/{{book_id}}", server.uri()), ResponseFormat::Passage)],
            Duration::from_millis(100),
        )
        .unwrap();
        let err = provider.fetch(&john_3_16(), "KJV").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Timeout);
    }

    #[test]
    fn test_requires_endpoints() {
        let err = HttpProvider::new(vec![], Duration::from_secs(1)).err().unwrap();
        assert_eq!(*err, ErrorKind::NoEndpoints);
    }
}
