//! Response envelope parsing
//!
//! Turns a decoded JSON body into a RawBatch. Accepted shapes:
//! - top-level array of objects
//! - object holding one or more lists under known keys (concatenated)
//! - object of objects keyed by id or epoch timestamp (tree stores)
//! - a single record object
//! - `null` (empty)

use serde_json::{Map, Value};

use crate::logic::error::SourceError;
use crate::logic::normalize::alias::{self, Field};
use crate::logic::types::{RawBatch, RawRecord};

/// Keys under which REST sources wrap their record lists, in concatenation order
const LIST_KEYS: &[&str] = &[
    "data",
    "records",
    "events",
    "items",
    "results",
    "detections",
    "device_data",
    "system_data",
    "pi_data",
    "time_data",
];

/// Parse a REST response body.
///
/// Every array found under a known list key is kept; lists are appended in
/// `LIST_KEYS` order.
pub fn parse_envelope(body: Value) -> Result<RawBatch, SourceError> {
    let Value::Object(mut map) = body else {
        return parse_tree(body);
    };

    let mut batch = RawBatch::new();
    let mut found = false;
    for key in LIST_KEYS {
        if !matches!(map.get(*key), Some(Value::Array(_))) {
            continue;
        }
        if let Some(Value::Array(items)) = map.remove(*key) {
            let records = objects(items);
            log::debug!("Envelope list `{}`: {} records", key, records.len());
            batch.extend(records);
            found = true;
        }
    }

    if found {
        Ok(batch)
    } else {
        parse_tree(Value::Object(map))
    }
}

/// Parse a tree-store read (no list-key unwrapping)
pub fn parse_tree(body: Value) -> Result<RawBatch, SourceError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(objects(items)),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Object(map) => {
            if has_field(&map, Field::Timestamp) {
                return Ok(vec![map]);
            }
            if map.values().any(Value::is_object) {
                return Ok(keyed_children(map));
            }
            Err(SourceError::MalformedEnvelope(
                "object carries neither records nor a record list".to_string(),
            ))
        }
        other => Err(SourceError::MalformedEnvelope(format!(
            "expected an array or object, got {}",
            type_name(&other)
        ))),
    }
}

/// Children of a keyed object. The key becomes `timestamp` when the child has none.
pub fn keyed_children(map: Map<String, Value>) -> RawBatch {
    let total = map.len();
    let batch: RawBatch = map
        .into_iter()
        .filter_map(|(key, child)| match child {
            Value::Object(mut record) => {
                if !has_field(&record, Field::Timestamp) {
                    record.insert("timestamp".to_string(), Value::String(key));
                }
                Some(record)
            }
            _ => None,
        })
        .collect();

    if batch.len() < total {
        log::debug!("Skipped {} non-object children", total - batch.len());
    }
    batch
}

/// Whether any key of the record resolves to `field`
pub fn has_field(record: &RawRecord, field: Field) -> bool {
    record.keys().any(|k| alias::resolve(k) == Some(field))
}

fn objects(items: Vec<Value>) -> RawBatch {
    let total = items.len();
    let batch: RawBatch = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect();

    if batch.len() < total {
        log::debug!("Skipped {} non-object list items", total - batch.len());
    }
    batch
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
