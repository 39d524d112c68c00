//! Local file source
//!
//! Re-reads a CSV / spreadsheet / JSON file on every poll.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{envelope, table, SourceAdapter};
use crate::logic::config::SourceKind;
use crate::logic::error::SourceError;
use crate::logic::types::RawBatch;

pub struct FileSource {
    path: PathBuf,
    required_columns: Vec<String>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required_columns: Vec::new(),
        }
    }

    /// Columns a table file must carry (JSON files are not checked)
    pub fn with_required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SourceAdapter for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                SourceError::AuthFailed(format!("{}: {}", self.path.display(), e))
            }
            _ => SourceError::Unreachable(format!("{}: {}", self.path.display(), e)),
        })?;

        if self.is_json() {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Vec::new());
            }
            let body = serde_json::from_slice(&bytes)
                .map_err(|e| SourceError::MalformedEnvelope(e.to_string()))?;
            return envelope::parse_envelope(body);
        }

        let name = self.path.to_string_lossy();
        table::parse_table(&name, &bytes, &self.required_columns)
            .map(|t| t.records)
            .map_err(|e| SourceError::MalformedEnvelope(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_csv_each_fetch() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,event_type,CPU").unwrap();
        writeln!(file, "2025-03-26 13:04:52,system_stats,40.3").unwrap();
        file.flush().unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap().len(), 1);

        writeln!(file, "2025-03-26 13:04:53,system_stats,41.0").unwrap();
        file.flush().unwrap();
        assert_eq!(source.fetch().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reads_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"records": [{{"ts": 1742994292, "label": "person"}}]}}"#).unwrap();
        file.flush().unwrap();

        let batch = FileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(batch[0]["label"], "person");
    }

    #[tokio::test]
    async fn test_missing_required_column_is_malformed() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,CPU").unwrap();
        writeln!(file, "2025-03-26 13:04:52,40.3").unwrap();
        file.flush().unwrap();

        let source = FileSource::new(file.path()).with_required_columns(vec!["TEMP".into()]);
        let err = source.fetch().await.unwrap_err();

        assert_eq!(
            err,
            SourceError::MalformedEnvelope("Missing required columns: TEMP".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("gone.csv"));

        assert!(matches!(source.fetch().await, Err(SourceError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_malformed() {
        let file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        let source = FileSource::new(file.path());

        assert!(matches!(source.fetch().await, Err(SourceError::MalformedEnvelope(_))));
    }
}
