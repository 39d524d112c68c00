//! Pipeline Configuration
//!
//! Loaded once at startup. Missing or malformed values are fatal
//! (`ConfigError`) and must stop startup before the scheduler runs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use super::error::ConfigError;
use super::fallback::FallbackPolicy;

// ============================================================================
// SOURCE KIND
// ============================================================================

/// Which remote feeds this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// REST JSON endpoint
    Http,
    /// Document collection listing
    Document,
    /// Realtime key-value tree store
    Realtime,
    /// Table file on disk
    File,
    /// Manually uploaded table
    Upload,
    /// Externally pushed records
    Push,
    /// Synthetic data
    Mock,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Http => "http",
            SourceKind::Document => "document",
            SourceKind::Realtime => "realtime",
            SourceKind::File => "file",
            SourceKind::Upload => "upload",
            SourceKind::Push => "push",
            SourceKind::Mock => "mock",
        }
    }

    /// Kinds that need an address to run at all
    pub fn requires_address(&self) -> bool {
        matches!(
            self,
            SourceKind::Http | SourceKind::Document | SourceKind::Realtime | SourceKind::File
        )
    }

    /// Whether the source emits records chronologically.
    ///
    /// Document listings come back in id order and tree stores in key order,
    /// so those are sorted before splitting.
    pub fn emits_sorted(&self) -> bool {
        !matches!(self, SourceKind::Document | SourceKind::Realtime)
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" | "api" => Ok(SourceKind::Http),
            "document" | "firestore" => Ok(SourceKind::Document),
            "realtime" | "rtdb" => Ok(SourceKind::Realtime),
            "file" | "csv" => Ok(SourceKind::File),
            "upload" => Ok(SourceKind::Upload),
            "push" => Ok(SourceKind::Push),
            "mock" => Ok(SourceKind::Mock),
            _ => Err(ConfigError::Invalid { key: ENV_SOURCE_KIND, value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Source address and per-kind options
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// URL or file path
    pub address: Option<String>,
    /// Tree path (realtime)
    pub path: String,
    /// Optional credential
    pub token: Option<String>,
    /// Required columns for table ingestion
    pub required_columns: Vec<String>,
    pub push_capacity: usize,
    pub mock_batch: usize,
    /// Fixed seed for the mock generator
    pub mock_seed: Option<u64>,
}

impl SourceConfig {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            address: None,
            path: DEFAULT_REALTIME_PATH.to_string(),
            token: None,
            required_columns: DEFAULT_REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            push_capacity: DEFAULT_PUSH_CAPACITY,
            mock_batch: DEFAULT_MOCK_BATCH,
            mock_seed: None,
        }
    }

    /// Address for kinds that require one
    pub fn require_address(&self) -> Result<&str, ConfigError> {
        self.address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_SOURCE_URL))
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    /// `None` disables windowing
    pub window: Option<chrono::Duration>,
    pub fallback: FallbackPolicy,
    /// Skip the chronological sort before splitting
    pub assume_sorted: bool,
}

impl PipelineConfig {
    pub fn new(source: SourceConfig) -> Self {
        let assume_sorted = source.kind.emits_sorted();
        Self {
            source,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            window: Some(chrono::Duration::hours(DEFAULT_WINDOW_HOURS)),
            fallback: FallbackPolicy::default(),
            assume_sorted,
        }
    }

    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = match get(ENV_SOURCE_KIND) {
            Some(v) => v.parse()?,
            None => SourceKind::Mock,
        };

        let mut source = SourceConfig::new(kind);
        source.address = get(ENV_SOURCE_URL);
        source.token = get(ENV_SOURCE_TOKEN);
        if let Some(path) = get(ENV_SOURCE_PATH) {
            source.path = path;
        }
        if let Some(cols) = get(ENV_REQUIRED_COLUMNS) {
            source.required_columns = cols
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(v) = get(ENV_PUSH_CAPACITY) {
            source.push_capacity = parse_positive(ENV_PUSH_CAPACITY, &v)? as usize;
        }
        if let Some(v) = get(ENV_MOCK_BATCH) {
            source.mock_batch = parse_positive(ENV_MOCK_BATCH, &v)? as usize;
        }

        let mut config = PipelineConfig::new(source);

        if let Some(v) = get(ENV_POLL_INTERVAL) {
            config.poll_interval = Duration::from_secs(parse_positive(ENV_POLL_INTERVAL, &v)?);
        }
        if let Some(v) = get(ENV_FETCH_TIMEOUT) {
            config.fetch_timeout = Duration::from_secs(parse_positive(ENV_FETCH_TIMEOUT, &v)?);
        }
        if let Some(v) = get(ENV_WINDOW_HOURS) {
            config.window = parse_window(&v)?;
        }
        if let Some(v) = get(ENV_SHOW_STALE) {
            config.fallback.show_stale = parse_bool(ENV_SHOW_STALE, &v)?;
        }
        if let Some(v) = get(ENV_ASSUME_SORTED) {
            config.assume_sorted = parse_bool(ENV_ASSUME_SORTED, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.kind.requires_address() {
            self.source.require_address()?;
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid { key: ENV_POLL_INTERVAL, value: "0".into() });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid { key: ENV_FETCH_TIMEOUT, value: "0".into() });
        }
        Ok(())
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value: value.to_string() }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: value.to_string() }),
    }
}

fn parse_window(value: &str) -> Result<Option<chrono::Duration>, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "0" | "none" | "all" | "off" => Ok(None),
        v => v
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h > 0.0 && h * 3600.0 < i64::MAX as f64)
            .and_then(|h| chrono::Duration::try_seconds((h * 3600.0).round() as i64))
            .map(Some)
            .ok_or_else(|| ConfigError::Invalid { key: ENV_WINDOW_HOURS, value: value.to_string() }),
    }
}
