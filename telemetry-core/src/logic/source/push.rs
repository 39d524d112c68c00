//! Push buffer
//!
//! Records posted by devices are stamped and buffered here; every fetch
//! returns the whole buffer. Oldest entries are evicted past capacity.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use uuid::Uuid;

use super::{envelope, SourceAdapter};
use crate::logic::config::SourceKind;
use crate::logic::error::{IngestError, SourceError};
use crate::logic::normalize::alias::Field;
use crate::logic::types::{RawBatch, RawRecord};

/// Acknowledgement for one pushed record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushReceipt {
    pub id: Uuid,
    pub received_at: String,
    /// Records buffered after this push
    pub buffered: usize,
}

pub struct PushBuffer {
    capacity: usize,
    records: RwLock<VecDeque<RawRecord>>,
}

impl PushBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: RwLock::new(VecDeque::new()),
        }
    }

    /// Buffer one record. Only JSON objects are accepted.
    pub fn push(&self, payload: Value) -> Result<PushReceipt, IngestError> {
        let Value::Object(mut record) = payload else {
            return Err(IngestError::NotAnObject);
        };

        let received_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        record.insert("received_at".to_string(), Value::String(received_at.clone()));
        if !envelope::has_field(&record, Field::Timestamp) {
            record.insert("timestamp".to_string(), Value::String(received_at.clone()));
        }

        let mut records = self.records.write();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }

        Ok(PushReceipt {
            id: Uuid::new_v4(),
            received_at,
            buffered: records.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn snapshot(&self) -> RawBatch {
        self.records.read().iter().cloned().collect()
    }
}

#[async_trait]
impl SourceAdapter for PushBuffer {
    fn kind(&self) -> SourceKind {
        SourceKind::Push
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_stamps_received_at() {
        let buffer = PushBuffer::new(10);

        let receipt = buffer.push(json!({"CPU": 40})).unwrap();
        let kept = buffer.push(json!({"timestamp": "2025-03-26 13:04:52"})).unwrap();

        let records = buffer.snapshot();
        assert_eq!(records[0]["timestamp"], Value::String(receipt.received_at.clone()));
        assert_eq!(records[1]["timestamp"], "2025-03-26 13:04:52");
        assert_eq!(kept.buffered, 2);
        assert_ne!(receipt.id, kept.id);
    }

    #[test]
    fn test_rejects_non_objects() {
        let buffer = PushBuffer::new(10);
        assert_eq!(buffer.push(json!([1, 2])).unwrap_err(), IngestError::NotAnObject);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let buffer = PushBuffer::new(2);
        for i in 0..3 {
            buffer.push(json!({"seq": i})).unwrap();
        }

        let records = buffer.snapshot();
        assert_eq!(buffer.len(), 2);
        assert_eq!(records[0]["seq"], 1);
        assert_eq!(records[1]["seq"], 2);
    }
}
