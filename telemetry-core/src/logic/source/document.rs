//! Document Collection Source
//!
//! Lists every document of one collection over the REST interface of a
//! document database and flattens the typed field encoding into plain
//! JSON records.
//!
//! Listing response:
//! ```json
//! { "documents": [ { "name": ".../events/abc", "fields": {..}, "createTime": ".." } ],
//!   "nextPageToken": ".." }
//! ```

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use std::time::Duration;

use super::{envelope, http, SourceAdapter};
use crate::constants::MAX_DOCUMENT_PAGES;
use crate::logic::config::SourceKind;
use crate::logic::error::{ConfigError, SourceError};
use crate::logic::normalize::alias::Field;
use crate::logic::types::{RawBatch, RawRecord};

/// Document collection adapter
pub struct DocumentSource {
    collection_url: String,
    token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl DocumentSource {
    pub fn new(
        collection_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            collection_url: collection_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
            client: http::build_client(timeout)?,
        })
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Value, SourceError> {
        let mut request = self.client.get(&self.collection_url);
        if let Some(page) = page_token {
            request = request.query(&[("pageToken", page)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        http::fetch_json(request, self.timeout).await
    }
}

#[async_trait]
impl SourceAdapter for DocumentSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Document
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let mut batch = RawBatch::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_DOCUMENT_PAGES {
            let page = self.fetch_page(page_token.as_deref()).await?;
            let (records, next) = parse_listing(page)?;
            batch.extend(records);

            match next {
                Some(next) => page_token = Some(next),
                None => return Ok(batch),
            }
        }

        log::warn!(
            "Document listing truncated at {} pages ({} records)",
            MAX_DOCUMENT_PAGES,
            batch.len()
        );
        Ok(batch)
    }
}

// ============================================================================
// LISTING DECODE
// ============================================================================

/// Decode one listing page into records and the next page token
pub fn parse_listing(body: Value) -> Result<(RawBatch, Option<String>), SourceError> {
    let mut map = match body {
        Value::Null => return Ok((Vec::new(), None)),
        Value::Object(map) => map,
        _ => {
            return Err(SourceError::MalformedEnvelope(
                "document listing is not an object".to_string(),
            ))
        }
    };

    let next = match map.remove("nextPageToken") {
        Some(Value::String(t)) if !t.is_empty() => Some(t),
        _ => None,
    };

    let documents = match map.remove("documents") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(docs)) => docs,
        Some(_) => {
            return Err(SourceError::MalformedEnvelope(
                "`documents` is not an array".to_string(),
            ))
        }
    };

    let records = documents
        .into_iter()
        .filter_map(|doc| match doc {
            Value::Object(doc) => Some(document_record(doc)),
            _ => None,
        })
        .collect();

    Ok((records, next))
}

/// Flatten one document. Adds `id` from the resource name and falls back to
/// `createTime` when the fields carry no timestamp.
fn document_record(mut doc: Map<String, Value>) -> RawRecord {
    let mut record = match doc.remove("fields") {
        Some(Value::Object(fields)) => decode_fields(fields),
        _ => RawRecord::new(),
    };

    if let Some(Value::String(name)) = doc.get("name") {
        if let Some(id) = name.rsplit('/').next().filter(|id| !id.is_empty()) {
            record.entry("id").or_insert_with(|| Value::String(id.to_string()));
        }
    }

    if !envelope::has_field(&record, Field::Timestamp) {
        if let Some(created) = doc.remove("createTime") {
            record.insert("created_at".to_string(), created);
        }
    }

    record
}

fn decode_fields(fields: Map<String, Value>) -> RawRecord {
    fields
        .into_iter()
        .map(|(key, typed)| (key, decode_value(typed)))
        .collect()
}

/// Typed value -> plain JSON
pub fn decode_value(typed: Value) -> Value {
    let Value::Object(mut map) = typed else {
        return typed;
    };

    if let Some(v) = map.remove("stringValue") {
        return v;
    }
    if let Some(v) = map.remove("integerValue") {
        // integers travel as strings
        return match &v {
            Value::String(s) => s
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .unwrap_or(v),
            _ => v,
        };
    }
    if let Some(v) = map.remove("doubleValue") {
        return v;
    }
    if let Some(v) = map.remove("booleanValue") {
        return v;
    }
    if let Some(v) = map.remove("timestampValue") {
        return v;
    }
    if map.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(Value::Object(mut inner)) = map.remove("mapValue") {
        return match inner.remove("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)),
            _ => Value::Object(Map::new()),
        };
    }
    if let Some(Value::Object(mut inner)) = map.remove("arrayValue") {
        return match inner.remove("values") {
            Some(Value::Array(values)) => {
                Value::Array(values.into_iter().map(decode_value).collect())
            }
            _ => Value::Array(Vec::new()),
        };
    }

    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_decode_typed_values() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/events/abc123",
            "fields": {
                "event_type": {"stringValue": "detection"},
                "label": {"stringValue": "person"},
                "confidence": {"doubleValue": 0.91},
                "distance": {"integerValue": "120"},
                "timestamp": {"timestampValue": "2025-03-26T13:04:52Z"},
                "meta": {"mapValue": {"fields": {"camera": {"stringValue": "front"}}}},
                "note": {"nullValue": null}
            },
            "createTime": "2025-03-26T13:04:53.000Z"
        });

        let (records, next) = parse_listing(json!({ "documents": [doc] })).unwrap();
        let record = &records[0];

        assert!(next.is_none());
        assert_eq!(record["id"], "abc123");
        assert_eq!(record["distance"], 120);
        assert_eq!(record["confidence"], 0.91);
        assert_eq!(record["meta"]["camera"], "front");
        assert_eq!(record["note"], Value::Null);
        assert!(!record.contains_key("created_at"));
    }

    #[test]
    fn test_create_time_fills_missing_timestamp() {
        let doc = json!({
            "name": "x/events/d1",
            "fields": {"CPU": {"doubleValue": 12.5}},
            "createTime": "2025-03-26T13:04:53Z"
        });

        let (records, _) = parse_listing(json!({ "documents": [doc] })).unwrap();
        assert_eq!(records[0]["created_at"], "2025-03-26T13:04:53Z");
    }

    #[test]
    fn test_empty_collection() {
        let (records, next) = parse_listing(json!({})).unwrap();
        assert!(records.is_empty());
        assert!(next.is_none());
        assert!(parse_listing(json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_fetch_follows_page_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/documents/events"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{"name": "e/2", "fields": {"CPU": {"integerValue": "20"}}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/documents/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{"name": "e/1", "fields": {"CPU": {"integerValue": "10"}}}],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let source = DocumentSource::new(
            format!("{}/documents/events", server.uri()),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let batch = source.fetch().await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0]["id"], "1");
        assert_eq!(batch[1]["CPU"], 20);
    }

    #[tokio::test]
    async fn test_forbidden_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source =
            DocumentSource::new(server.uri(), Some("t".into()), Duration::from_secs(2)).unwrap();

        assert!(matches!(source.fetch().await, Err(SourceError::AuthFailed(_))));
    }
}
