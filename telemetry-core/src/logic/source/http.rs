//! REST JSON Source
//!
//! HTTP client for a JSON telemetry endpoint. One GET per fetch, bounded
//! by the client timeout, no internal retry.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{envelope, SourceAdapter};
use crate::logic::config::SourceKind;
use crate::logic::error::{ConfigError, SourceError};
use crate::logic::types::RawBatch;

/// Build the shared reqwest client with a fixed timeout
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("telemetry-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Send a request and decode the JSON body
pub(crate) async fn fetch_json(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::from_transport(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::from_status(status));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| SourceError::from_transport(e, timeout))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&body).map_err(|e| SourceError::MalformedEnvelope(e.to_string()))
}

/// REST endpoint adapter
pub struct HttpSource {
    url: String,
    token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            url: url.into(),
            token,
            timeout,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl SourceAdapter for HttpSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Http
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body = fetch_json(request, self.timeout).await?;
        envelope::parse_envelope(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer, token: Option<&str>) -> HttpSource {
        HttpSource::new(
            format!("{}/data", server.uri()),
            token.map(str::to_string),
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_wrapped_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    {"timestamp": "2025-03-26 13:04:52", "event_type": "system_stats", "CPU": "40.3"},
                    {"timestamp": "2025-03-26 13:04:53", "event_type": "detection", "label": "person"}
                ]
            })))
            .mount(&server)
            .await;

        let batch = source_for(&server, Some("s3cret")).await.fetch().await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1]["label"], "person");
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = source_for(&server, None).await.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server, None).await.fetch().await.unwrap_err();
        assert_eq!(err, SourceError::Unreachable("HTTP 503".to_string()));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = source_for(&server, None).await.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::MalformedEnvelope(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = source_for(&server, None).await.fetch().await.unwrap_err();
        assert_eq!(err, SourceError::Timeout(Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let source =
            HttpSource::new("http://127.0.0.1:9/data", None, Duration::from_millis(500)).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Unreachable(_) | SourceError::Timeout(_)));
    }
}
