//! Error taxonomy
//!
//! Source-level failures are values: the scheduler turns them into the
//! `Unavailable` state. Only configuration errors are fatal.

use std::time::Duration;
use thiserror::Error;

/// Adapter failure for one fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("source unreachable: {0}")]
    Unreachable(String),

    #[error("source timed out after {0:?}")]
    Timeout(Duration),

    #[error("source authentication failed: {0}")]
    AuthFailed(String),

    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

impl SourceError {
    /// Short machine tag, surfaced in status payloads
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Unreachable(_) => "source_unreachable",
            SourceError::Timeout(_) => "source_unreachable",
            SourceError::AuthFailed(_) => "source_auth_failed",
            SourceError::MalformedEnvelope(_) => "malformed_envelope",
        }
    }

    /// Map a reqwest transport error
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout)
        } else if err.is_decode() {
            SourceError::MalformedEnvelope(err.to_string())
        } else {
            SourceError::Unreachable(err.to_string())
        }
    }

    /// Map a non-success HTTP status
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => SourceError::AuthFailed(format!("HTTP {}", status.as_u16())),
            code => SourceError::Unreachable(format!("HTTP {}", code)),
        }
    }
}

/// Per-record coercion failure. Absorbed and counted, never surfaced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("record coercion failed: no timestamp field")]
    MissingTimestamp,

    #[error("record coercion failed: unparsable timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Startup configuration error. Terminates startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Upload / file ingestion failure. Nothing is imported on error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("could not decode upload: {0}")]
    Decode(String),

    #[error("could not parse table: {0}")]
    Parse(String),

    #[error("pushed payload must be a JSON object")]
    NotAnObject,
}
