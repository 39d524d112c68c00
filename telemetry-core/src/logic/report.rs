//! CSV Report
//!
//! Xuất committed view ra CSV cho nút "Download Report" của dashboard.
//! One row per record, fixed canonical header, absent fields left blank.

use serde::Serialize;

use super::types::{CanonicalRecord, EventType};

pub const REPORT_HEADER: [&str; 9] = [
    "timestamp",
    "event_type",
    "label",
    "confidence",
    "estimated_distance_cm",
    "fps",
    "cpu_pct",
    "mem_pct",
    "temp_c",
];

#[derive(Serialize)]
struct ReportRow<'a> {
    timestamp: String,
    event_type: &'static str,
    label: Option<&'a str>,
    confidence: Option<f64>,
    estimated_distance_cm: Option<f64>,
    fps: Option<f64>,
    cpu_pct: Option<f64>,
    mem_pct: Option<f64>,
    temp_c: Option<f64>,
}

impl<'a> From<&'a CanonicalRecord> for ReportRow<'a> {
    fn from(r: &'a CanonicalRecord) -> Self {
        Self {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            event_type: r.event_type.as_str(),
            label: r.label.as_deref(),
            confidence: r.confidence,
            estimated_distance_cm: r.estimated_distance_cm,
            fps: r.fps,
            cpu_pct: r.cpu_pct,
            mem_pct: r.mem_pct,
            temp_c: r.temp_c,
        }
    }
}

/// Render records as CSV, optionally keeping a single event type.
///
/// The header is always written, so an empty view still yields a valid file.
pub fn to_csv(records: &[CanonicalRecord], only: Option<EventType>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER)?;
    let mut rows = 0;
    for record in records.iter().filter(|r| only.map_or(true, |t| r.event_type == t)) {
        writer.serialize(ReportRow::from(record))?;
        rows += 1;
    }

    log::debug!("Report rendered: {} rows", rows);
    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
