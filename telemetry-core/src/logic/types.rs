//! Pipeline Types
//!
//! Core data shapes cho acquisition pipeline.
//! KHÔNG chứa logic - chỉ data structures.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::SourceError;

// ============================================================================
// RAW INPUT
// ============================================================================

/// One untyped record as delivered by a source adapter.
///
/// No guarantees about completeness, value types or key casing.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Ordered records from a single fetch.
pub type RawBatch = Vec<RawRecord>;

// ============================================================================
// CANONICAL SCHEMA
// ============================================================================

/// Event classification of a canonical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Periodic resource/environment sample
    SystemStats,
    /// Discrete object observation
    Detection,
    /// Discriminator missing or unrecognized
    Unknown,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SystemStats => "system_stats",
            EventType::Detection => "detection",
            EventType::Unknown => "unknown",
        }
    }

    /// Classify a discriminator value. Unrecognized tags map to `Unknown`.
    pub fn classify(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match tag.as_str() {
            "system_stats" | "systemstats" | "system" | "stats" | "system_stat" => {
                EventType::SystemStats
            }
            "detection" | "detections" | "detect" | "detected" => EventType::Detection,
            _ => EventType::Unknown,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated record produced by the normalizer.
///
/// `timestamp` and `event_type` are always present. Numeric fields, when
/// present, are finite and inside their physical range (see
/// [`super::normalize::FieldRange`]). A field that could not be resolved
/// from the raw input is `None`, never a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub timestamp: NaiveDateTime,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_distance_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
}

impl CanonicalRecord {
    /// Record with only the mandatory fields set
    pub fn new(timestamp: NaiveDateTime, event_type: EventType) -> Self {
        Self {
            timestamp,
            event_type,
            label: None,
            confidence: None,
            estimated_distance_cm: None,
            fps: None,
            cpu_pct: None,
            mem_pct: None,
            temp_c: None,
        }
    }
}

// ============================================================================
// CYCLE OUTCOME
// ============================================================================

/// Tagged outcome of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    /// Source answered and at least one record survived normalization
    Success(Vec<CanonicalRecord>),
    /// Adapter call failed (network, auth, envelope, timeout)
    SourceUnavailable(SourceError),
    /// Source answered but nothing usable came back
    EmptySource,
}

impl AcquisitionResult {
    /// Build the outcome for a cycle whose adapter call succeeded
    pub fn from_records(records: Vec<CanonicalRecord>) -> Self {
        if records.is_empty() {
            AcquisitionResult::EmptySource
        } else {
            AcquisitionResult::Success(records)
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            AcquisitionResult::Success(records) => records.len(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_event_tags() {
        assert_eq!(EventType::classify("system_stats"), EventType::SystemStats);
        assert_eq!(EventType::classify(" System-Stats "), EventType::SystemStats);
        assert_eq!(EventType::classify("DETECTION"), EventType::Detection);
        assert_eq!(EventType::classify("heartbeat"), EventType::Unknown);
        assert_eq!(EventType::classify(""), EventType::Unknown);
    }

    #[test]
    fn test_empty_records_are_empty_source() {
        assert_eq!(AcquisitionResult::from_records(vec![]), AcquisitionResult::EmptySource);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let ts = NaiveDateTime::parse_from_str("2025-03-26 13:04:52", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut record = CanonicalRecord::new(ts, EventType::SystemStats);
        record.cpu_pct = Some(40.3);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event_type"], "system_stats");
        assert_eq!(json["cpu_pct"], 40.3);
        assert!(json.get("fps").is_none());
    }
}
