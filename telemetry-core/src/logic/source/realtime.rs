//! Realtime Tree Source
//!
//! Reads one path of a key-value tree store over its REST interface
//! (`GET {base}{path}.json`). Children are usually keyed by epoch seconds.

use async_trait::async_trait;
use std::time::Duration;

use super::{envelope, http, SourceAdapter};
use crate::logic::config::SourceKind;
use crate::logic::error::{ConfigError, SourceError};
use crate::logic::types::RawBatch;

pub struct RealtimeSource {
    url: String,
    token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl RealtimeSource {
    pub fn new(
        base_url: &str,
        path: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            url: tree_url(base_url, path),
            token,
            timeout,
            client: http::build_client(timeout)?,
        })
    }
}

/// `https://db.test/` + `/detections` -> `https://db.test/detections.json`
pub fn tree_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".json").unwrap_or(path);

    if path.is_empty() {
        format!("{}/.json", base)
    } else {
        format!("{}/{}.json", base, path)
    }
}

#[async_trait]
impl SourceAdapter for RealtimeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Realtime
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.query(&[("auth", token.as_str())]);
        }

        let body = http::fetch_json(request, self.timeout).await?;
        envelope::parse_tree(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tree_url() {
        assert_eq!(tree_url("https://db.test/", "/detections"), "https://db.test/detections.json");
        assert_eq!(tree_url("https://db.test", "a/b.json"), "https://db.test/a/b.json");
        assert_eq!(tree_url("https://db.test", "/"), "https://db.test/.json");
    }

    #[tokio::test]
    async fn test_fetch_keyed_tree() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detections.json"))
            .and(query_param("auth", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1742994293": {"label": "car", "confidence": 0.8},
                "1742994292": {"label": "person", "confidence": 0.9}
            })))
            .mount(&server)
            .await;

        let source =
            RealtimeSource::new(&server.uri(), "/detections", Some("k".into()), Duration::from_secs(2))
                .unwrap();
        let batch = source.fetch().await.unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|r| r.contains_key("timestamp")));
    }

    #[tokio::test]
    async fn test_missing_path_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let source = RealtimeSource::new(&server.uri(), "/nothing", None, Duration::from_secs(2)).unwrap();
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
