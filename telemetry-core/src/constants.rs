//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.

/// Default poll cadence (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default bound on one adapter call (seconds)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

/// Default time window (hours)
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Default tree path for the realtime store
pub const DEFAULT_REALTIME_PATH: &str = "/detections";

/// Columns an uploaded table must carry unless the deployment says otherwise
pub const DEFAULT_REQUIRED_COLUMNS: &[&str] = &["event_type", "CPU", "MEM", "TEMP", "FPS"];

/// Push buffer retention
pub const DEFAULT_PUSH_CAPACITY: usize = 10_000;

/// Records generated per mock fetch
pub const DEFAULT_MOCK_BATCH: usize = 8;

/// Page limit when listing a document collection
pub const MAX_DOCUMENT_PAGES: usize = 20;

/// Core crate version, reported by the health endpoint
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Environment variable names
// ============================================

pub const ENV_SOURCE_KIND: &str = "TELEMETRY_SOURCE_KIND";
pub const ENV_SOURCE_URL: &str = "TELEMETRY_SOURCE_URL";
pub const ENV_SOURCE_PATH: &str = "TELEMETRY_SOURCE_PATH";
pub const ENV_SOURCE_TOKEN: &str = "TELEMETRY_SOURCE_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "TELEMETRY_POLL_INTERVAL_SECS";
pub const ENV_FETCH_TIMEOUT: &str = "TELEMETRY_FETCH_TIMEOUT_SECS";
pub const ENV_WINDOW_HOURS: &str = "TELEMETRY_WINDOW_HOURS";
pub const ENV_SHOW_STALE: &str = "TELEMETRY_SHOW_STALE";
pub const ENV_ASSUME_SORTED: &str = "TELEMETRY_ASSUME_SORTED";
pub const ENV_REQUIRED_COLUMNS: &str = "TELEMETRY_REQUIRED_COLUMNS";
pub const ENV_PUSH_CAPACITY: &str = "TELEMETRY_PUSH_CAPACITY";
pub const ENV_MOCK_BATCH: &str = "TELEMETRY_MOCK_BATCH";
