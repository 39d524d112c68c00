//! Fallback / Degradation Policy
//!
//! Phân loại lại trạng thái nguồn mỗi cycle:
//! - `Nominal`     - cycle succeeded with at least one record
//! - `Degraded`    - source answered, nothing usable
//! - `Unavailable` - adapter call failed outright
//!
//! A previous `Nominal` never carries over a failed cycle. The last-known-good
//! set is kept separately and may be shown, labelled stale, when configured.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::{AcquisitionResult, CanonicalRecord};

// ============================================================================
// STATE TAG
// ============================================================================

/// Connectivity indicator for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Nominal,
    Degraded,
    Unavailable,
}

impl SourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceState::Nominal => "nominal",
            SourceState::Degraded => "degraded",
            SourceState::Unavailable => "unavailable",
        }
    }

    /// Classification of a cycle outcome
    pub fn of(result: &AcquisitionResult) -> Self {
        match result {
            AcquisitionResult::Success(records) if !records.is_empty() => SourceState::Nominal,
            AcquisitionResult::Success(_) | AcquisitionResult::EmptySource => SourceState::Degraded,
            AcquisitionResult::SourceUnavailable(_) => SourceState::Unavailable,
        }
    }
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RESOLVED OUTPUT
// ============================================================================

/// What consumers see after a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOutput {
    /// Records to show (current, previous-cycle, or empty)
    pub records: Arc<Vec<CanonicalRecord>>,
    pub state: SourceState,
    /// `records` come from an earlier cycle
    pub stale: bool,
    /// Most recent Nominal record set
    #[serde(skip)]
    pub last_good: Arc<Vec<CanonicalRecord>>,
}

impl ResolvedOutput {
    /// Startup value: an empty success
    pub fn initial() -> Self {
        let empty = Arc::new(Vec::new());
        Self {
            records: empty.clone(),
            state: SourceState::Nominal,
            stale: false,
            last_good: empty,
        }
    }
}

impl Default for ResolvedOutput {
    fn default() -> Self {
        Self::initial()
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Show last-known-good records while Degraded/Unavailable
    pub show_stale: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self { show_stale: true }
    }
}

impl FallbackPolicy {
    pub fn new(show_stale: bool) -> Self {
        Self { show_stale }
    }

    /// Resolve a new cycle outcome against the previous output
    pub fn resolve(&self, result: AcquisitionResult, previous: &ResolvedOutput) -> ResolvedOutput {
        let state = SourceState::of(&result);

        match result {
            AcquisitionResult::Success(records) if !records.is_empty() => {
                let records = Arc::new(records);
                ResolvedOutput {
                    records: records.clone(),
                    state,
                    stale: false,
                    last_good: records,
                }
            }
            _ => {
                let last_good = previous.last_good.clone();
                let (records, stale) = if self.show_stale && !last_good.is_empty() {
                    (last_good.clone(), true)
                } else {
                    (Arc::new(Vec::new()), false)
                };
                ResolvedOutput { records, state, stale, last_good }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::error::SourceError;
    use crate::logic::types::EventType;
    use chrono::NaiveDateTime;

    fn records(n: usize) -> Vec<CanonicalRecord> {
        let ts = NaiveDateTime::parse_from_str("2025-03-26 13:04:52", "%Y-%m-%d %H:%M:%S").unwrap();
        (0..n).map(|_| CanonicalRecord::new(ts, EventType::SystemStats)).collect()
    }

    fn unreachable() -> AcquisitionResult {
        AcquisitionResult::SourceUnavailable(SourceError::Unreachable("connection refused".into()))
    }

    #[test]
    fn test_success_is_nominal() {
        let out = FallbackPolicy::default()
            .resolve(AcquisitionResult::Success(records(2)), &ResolvedOutput::initial());

        assert_eq!(out.state, SourceState::Nominal);
        assert_eq!(out.records.len(), 2);
        assert!(!out.stale);
    }

    #[test]
    fn test_failure_after_success_is_unavailable() {
        let policy = FallbackPolicy::default();
        let good = policy.resolve(AcquisitionResult::Success(records(3)), &ResolvedOutput::initial());

        let out = policy.resolve(unreachable(), &good);

        assert_eq!(out.state, SourceState::Unavailable);
        assert!(out.stale);
        assert_eq!(out.records.len(), 3);
    }

    #[test]
    fn test_blank_view_when_stale_disabled() {
        let policy = FallbackPolicy::new(false);
        let good = policy.resolve(AcquisitionResult::Success(records(3)), &ResolvedOutput::initial());

        let out = policy.resolve(AcquisitionResult::EmptySource, &good);

        assert_eq!(out.state, SourceState::Degraded);
        assert!(out.records.is_empty());
        assert!(!out.stale);
        assert_eq!(out.last_good.len(), 3);
    }

    #[test]
    fn test_last_good_survives_consecutive_failures() {
        let policy = FallbackPolicy::default();
        let good = policy.resolve(AcquisitionResult::Success(records(1)), &ResolvedOutput::initial());
        let first = policy.resolve(unreachable(), &good);
        let second = policy.resolve(AcquisitionResult::EmptySource, &first);

        assert_eq!(second.state, SourceState::Degraded);
        assert_eq!(second.records.len(), 1);
        assert!(second.stale);
    }

    #[test]
    fn test_empty_success_is_degraded() {
        let out = FallbackPolicy::default()
            .resolve(AcquisitionResult::Success(vec![]), &ResolvedOutput::initial());

        assert_eq!(out.state, SourceState::Degraded);
        assert!(out.records.is_empty());
        assert!(!out.stale);
    }

    #[test]
    fn test_recovery_replaces_stale_data() {
        let policy = FallbackPolicy::default();
        let good = policy.resolve(AcquisitionResult::Success(records(1)), &ResolvedOutput::initial());
        let failed = policy.resolve(unreachable(), &good);

        let recovered = policy.resolve(AcquisitionResult::Success(records(4)), &failed);

        assert_eq!(recovered.state, SourceState::Nominal);
        assert_eq!(recovered.records.len(), 4);
        assert!(!recovered.stale);
    }
}
