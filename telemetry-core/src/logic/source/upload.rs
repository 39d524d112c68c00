//! Manual upload source
//!
//! Holds the last successfully ingested table. A rejected upload leaves the
//! previous table in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::{table, SourceAdapter};
use crate::logic::config::SourceKind;
use crate::logic::error::{IngestError, SourceError};
use crate::logic::types::RawBatch;

/// Ingest result returned to the uploader
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub filename: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

struct UploadedTable {
    summary: UploadSummary,
    records: RawBatch,
}

pub struct UploadSource {
    required_columns: Vec<String>,
    current: RwLock<Option<UploadedTable>>,
}

impl UploadSource {
    pub fn new(required_columns: Vec<String>) -> Self {
        Self {
            required_columns,
            current: RwLock::new(None),
        }
    }

    /// Ingest raw file bytes
    pub fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<UploadSummary, IngestError> {
        let parsed = table::parse_table(filename, bytes, &self.required_columns)?;

        let summary = UploadSummary {
            filename: filename.to_string(),
            rows: parsed.records.len(),
            columns: parsed.columns,
            uploaded_at: Utc::now(),
        };

        log::info!("Upload accepted: {} ({} rows)", summary.filename, summary.rows);

        *self.current.write() = Some(UploadedTable {
            summary: summary.clone(),
            records: parsed.records,
        });
        Ok(summary)
    }

    /// Ingest a `data:` URL or base64 payload
    pub fn ingest_encoded(&self, filename: &str, contents: &str) -> Result<UploadSummary, IngestError> {
        let bytes = table::decode_contents(contents)?;
        self.ingest(filename, &bytes)
    }

    pub fn summary(&self) -> Option<UploadSummary> {
        self.current.read().as_ref().map(|t| t.summary.clone())
    }
}

#[async_trait]
impl SourceAdapter for UploadSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Upload
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        Ok(self
            .current
            .read()
            .as_ref()
            .map(|t| t.records.clone())
            .unwrap_or_default())
    }
}
