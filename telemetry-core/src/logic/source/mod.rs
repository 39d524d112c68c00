//! Source Adapters
//!
//! One adapter per remote kind, all behind `SourceAdapter`. An adapter
//! performs exactly one read per `fetch()` and never retries; retry and
//! fallback belong to the scheduler.

pub mod document;
pub mod envelope;
pub mod file;
pub mod http;
pub mod mock;
pub mod push;
pub mod realtime;
pub mod table;
pub mod upload;

use async_trait::async_trait;
use std::sync::Arc;

use super::config::{PipelineConfig, SourceKind};
use super::error::{ConfigError, SourceError};
use super::types::RawBatch;

pub use document::DocumentSource;
pub use file::FileSource;
pub use http::HttpSource;
pub use mock::MockSource;
pub use push::{PushBuffer, PushReceipt};
pub use realtime::RealtimeSource;
pub use upload::{UploadSource, UploadSummary};

/// Uniform fetch interface over every source kind
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// One read of the current remote data
    async fn fetch(&self) -> Result<RawBatch, SourceError>;
}

/// Adapter plus the handles the HTTP surface writes into
#[derive(Clone)]
pub struct Sources {
    pub adapter: Arc<dyn SourceAdapter>,
    pub upload: Option<Arc<UploadSource>>,
    pub push: Option<Arc<PushBuffer>>,
}

impl Sources {
    pub fn from_adapter(adapter: Arc<dyn SourceAdapter>) -> Self {
        Self { adapter, upload: None, push: None }
    }
}

/// Build the adapter selected by the configuration
pub fn build(config: &PipelineConfig) -> Result<Sources, ConfigError> {
    let source = &config.source;
    let timeout = config.fetch_timeout;

    let sources = match source.kind {
        SourceKind::Http => Sources::from_adapter(Arc::new(HttpSource::new(
            source.require_address()?,
            source.token.clone(),
            timeout,
        )?)),
        SourceKind::Document => Sources::from_adapter(Arc::new(DocumentSource::new(
            source.require_address()?,
            source.token.clone(),
            timeout,
        )?)),
        SourceKind::Realtime => Sources::from_adapter(Arc::new(RealtimeSource::new(
            source.require_address()?,
            &source.path,
            source.token.clone(),
            timeout,
        )?)),
        SourceKind::File => Sources::from_adapter(Arc::new(
            FileSource::new(source.require_address()?)
                .with_required_columns(source.required_columns.clone()),
        )),
        SourceKind::Upload => {
            let upload = Arc::new(UploadSource::new(source.required_columns.clone()));
            Sources {
                adapter: upload.clone(),
                upload: Some(upload),
                push: None,
            }
        }
        SourceKind::Push => {
            let push = Arc::new(PushBuffer::new(source.push_capacity));
            Sources {
                adapter: push.clone(),
                upload: None,
                push: Some(push),
            }
        }
        SourceKind::Mock => {
            Sources::from_adapter(Arc::new(MockSource::new(source.mock_batch, source.mock_seed)))
        }
    };

    log::info!("Source adapter ready: {}", sources.adapter.kind());
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::SourceConfig;

    #[test]
    fn test_build_each_kind() {
        let cases = [
            (SourceKind::Http, Some("http://127.0.0.1:1/data")),
            (SourceKind::Document, Some("http://127.0.0.1:1/documents/events")),
            (SourceKind::Realtime, Some("http://127.0.0.1:1")),
            (SourceKind::File, Some("/tmp/telemetry.csv")),
            (SourceKind::Upload, None),
            (SourceKind::Push, None),
            (SourceKind::Mock, None),
        ];

        for (kind, address) in cases {
            let mut source = SourceConfig::new(kind);
            source.address = address.map(str::to_string);

            let built = build(&PipelineConfig::new(source)).unwrap();
            assert_eq!(built.adapter.kind(), kind);
            assert_eq!(built.upload.is_some(), kind == SourceKind::Upload);
            assert_eq!(built.push.is_some(), kind == SourceKind::Push);
        }
    }

    #[test]
    fn test_networked_kind_requires_address() {
        let config = PipelineConfig::new(SourceConfig::new(SourceKind::Document));
        assert!(matches!(build(&config), Err(ConfigError::Missing(_))));
    }
}
