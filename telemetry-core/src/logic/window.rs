//! Window & Filter Stage
//!
//! Giới hạn records trong time window và tách thành sub-streams theo event type.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::{CanonicalRecord, EventType};

/// Keep records with `timestamp >= now - window`.
///
/// `window = None` means unbounded: every record passes. Input order is
/// preserved.
pub fn select(
    records: Vec<CanonicalRecord>,
    now: NaiveDateTime,
    window: Option<Duration>,
) -> Vec<CanonicalRecord> {
    let cutoff = window.and_then(|w| now.checked_sub_signed(w));
    match cutoff {
        Some(cutoff) => records.into_iter().filter(|r| r.timestamp >= cutoff).collect(),
        None => records,
    }
}

/// Stable sort by timestamp ascending (for sources known to be unsorted)
pub fn sort_chronologically(records: &mut [CanonicalRecord]) {
    records.sort_by_key(|r| r.timestamp);
}

/// Records grouped by event type, insertion order kept within each stream
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Streams {
    pub system_stats: Vec<CanonicalRecord>,
    pub detection: Vec<CanonicalRecord>,
    pub unknown: Vec<CanonicalRecord>,
}

impl Streams {
    pub fn get(&self, event_type: EventType) -> &[CanonicalRecord] {
        match event_type {
            EventType::SystemStats => &self.system_stats,
            EventType::Detection => &self.detection,
            EventType::Unknown => &self.unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.system_stats.len() + self.detection.len() + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-type counts, for status payloads
    pub fn counts(&self) -> BTreeMap<EventType, usize> {
        [EventType::SystemStats, EventType::Detection, EventType::Unknown]
            .into_iter()
            .map(|t| (t, self.get(t).len()))
            .collect()
    }

    /// KPI aggregates over the split view
    pub fn summary(&self) -> StreamSummary {
        let mut labels = BTreeMap::new();
        for label in self.detection.iter().filter_map(|r| r.label.as_deref()) {
            *labels.entry(label.to_string()).or_insert(0) += 1;
        }

        StreamSummary {
            system_samples: self.system_stats.len(),
            detections: self.detection.len(),
            unknown: self.unknown.len(),
            mean_cpu_pct: mean(&self.system_stats, |r| r.cpu_pct),
            mean_mem_pct: mean(&self.system_stats, |r| r.mem_pct),
            mean_temp_c: mean(&self.system_stats, |r| r.temp_c),
            mean_fps: mean(&self.detection, |r| r.fps),
            mean_confidence: mean(&self.detection, |r| r.confidence),
            labels,
        }
    }
}

// ============================================================================
// KPI SUMMARY
// ============================================================================

/// Dashboard KPI cards: sample counts and per-metric means.
///
/// A mean is `None` when no record in its stream carries the field; missing
/// values are skipped, never counted as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamSummary {
    pub system_samples: usize,
    pub detections: usize,
    pub unknown: usize,
    pub mean_cpu_pct: Option<f64>,
    pub mean_mem_pct: Option<f64>,
    pub mean_temp_c: Option<f64>,
    pub mean_fps: Option<f64>,
    pub mean_confidence: Option<f64>,
    /// Detections per label
    pub labels: BTreeMap<String, usize>,
}

fn mean(records: &[CanonicalRecord], field: impl Fn(&CanonicalRecord) -> Option<f64>) -> Option<f64> {
    let (sum, n) = records
        .iter()
        .filter_map(field)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Split records into per-type streams
pub fn split_by_type(records: &[CanonicalRecord]) -> Streams {
    let mut streams = Streams::default();
    for record in records {
        let stream = match record.event_type {
            EventType::SystemStats => &mut streams.system_stats,
            EventType::Detection => &mut streams.detection,
            EventType::Unknown => &mut streams.unknown,
        };
        stream.push(record.clone());
    }
    streams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minute: u32, event_type: EventType) -> CanonicalRecord {
        let ts = NaiveDateTime::parse_from_str(
            &format!("2025-03-26 13:{:02}:00", minute),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        CanonicalRecord::new(ts, event_type)
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-03-26 13:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_select_keeps_only_window() {
        let records = vec![
            at(0, EventType::SystemStats),
            at(20, EventType::Detection),
            at(25, EventType::SystemStats),
            at(5, EventType::Detection),
        ];

        let out = select(records.clone(), now(), Some(Duration::minutes(10)));

        assert_eq!(out, vec![records[1].clone(), records[2].clone()]);
        let cutoff = now() - Duration::minutes(10);
        assert!(out.iter().all(|r| r.timestamp >= cutoff));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let out = select(vec![at(20, EventType::Detection)], now(), Some(Duration::minutes(10)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_unbounded_window_passes_everything() {
        let records = vec![at(9, EventType::Detection), at(1, EventType::SystemStats)];
        assert_eq!(select(records.clone(), now(), None), records);
    }

    #[test]
    fn test_split_preserves_insertion_order() {
        let records = vec![
            at(3, EventType::Detection),
            at(1, EventType::SystemStats),
            at(2, EventType::Detection),
            at(4, EventType::Unknown),
        ];

        let streams = split_by_type(&records);

        assert_eq!(streams.detection, vec![records[0].clone(), records[2].clone()]);
        assert_eq!(streams.system_stats, vec![records[1].clone()]);
        assert_eq!(streams.unknown.len(), 1);
        assert_eq!(streams.len(), 4);
        assert_eq!(streams.counts()[&EventType::Detection], 2);
    }

    #[test]
    fn test_summary_means_skip_missing_fields() {
        let mut a = at(1, EventType::SystemStats);
        a.cpu_pct = Some(40.0);
        a.mem_pct = Some(50.0);
        let mut b = at(2, EventType::SystemStats);
        b.cpu_pct = Some(60.0);
        let mut d1 = at(3, EventType::Detection);
        d1.label = Some("person".into());
        d1.fps = Some(8.0);
        let mut d2 = at(4, EventType::Detection);
        d2.label = Some("person".into());
        let mut d3 = at(5, EventType::Detection);
        d3.label = Some("car".into());
        d3.fps = Some(12.0);

        let summary = split_by_type(&[a, b, d1, d2, d3, at(6, EventType::Unknown)]).summary();

        assert_eq!(summary.system_samples, 2);
        assert_eq!(summary.detections, 3);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.mean_cpu_pct, Some(50.0));
        assert_eq!(summary.mean_mem_pct, Some(50.0));
        assert_eq!(summary.mean_temp_c, None);
        assert_eq!(summary.mean_fps, Some(10.0));
        assert_eq!(summary.mean_confidence, None);
        assert_eq!(summary.labels["person"], 2);
        assert_eq!(summary.labels["car"], 1);
    }

    #[test]
    fn test_summary_of_empty_view() {
        let summary = Streams::default().summary();
        assert_eq!(summary, StreamSummary::default());
        assert!(summary.mean_cpu_pct.is_none());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut a = at(5, EventType::Detection);
        a.label = Some("first".into());
        let mut b = at(5, EventType::Detection);
        b.label = Some("second".into());
        let mut records = vec![at(7, EventType::SystemStats), a, b];

        sort_chronologically(&mut records);

        assert_eq!(records[0].label.as_deref(), Some("first"));
        assert_eq!(records[1].label.as_deref(), Some("second"));
        assert_eq!(records[2].event_type, EventType::SystemStats);
    }
}
