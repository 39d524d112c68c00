//! Schema Normalizer
//!
//! Map heterogeneous raw records về canonical schema.
//!
//! ## Rules
//! - `event_type` comes from the discriminator field; missing or
//!   unrecognized tags become `unknown` (record kept)
//! - numeric fields use tolerant parsing; failures leave the field absent
//! - a record without a parsable timestamp is dropped and counted
//! - out-of-range numbers are clamped to the nearest bound and counted
//!
//! `normalize` is a pure function of its input.

pub mod alias;
pub mod coerce;


use serde::Serialize;

use super::error::CoercionError;
use super::types::{CanonicalRecord, EventType, RawRecord};
use alias::Field;

// ============================================================================
// PHYSICAL RANGES
// ============================================================================

/// Inclusive bounds for a numeric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub const PERCENT: FieldRange = FieldRange { min: 0.0, max: 100.0 };
    pub const CONFIDENCE: FieldRange = FieldRange { min: 0.0, max: 1.0 };
    pub const NON_NEGATIVE: FieldRange = FieldRange { min: 0.0, max: f64::MAX };
    /// Absolute zero upward
    pub const CELSIUS: FieldRange = FieldRange { min: -273.15, max: f64::MAX };

    pub fn for_field(field: Field) -> Option<FieldRange> {
        match field {
            Field::Confidence => Some(Self::CONFIDENCE),
            Field::CpuPct | Field::MemPct => Some(Self::PERCENT),
            Field::EstimatedDistanceCm | Field::Fps => Some(Self::NON_NEGATIVE),
            Field::TempC => Some(Self::CELSIUS),
            Field::Timestamp | Field::EventType | Field::Label => None,
        }
    }

    /// Clamp into range; returns the value and whether it moved
    pub fn clamp(&self, value: f64) -> (f64, bool) {
        let clamped = value.clamp(self.min, self.max);
        (clamped, clamped != value)
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Normalization output plus the counters the poll loop logs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub records: Vec<CanonicalRecord>,
    /// Records dropped for an unusable timestamp
    pub dropped: usize,
    /// Numeric values moved into range
    pub clamped: usize,
    /// Records kept with the `unknown` tag
    pub unknown: usize,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Normalize a batch. Never fails; unusable records are dropped.
pub fn normalize(batch: &[RawRecord]) -> Vec<CanonicalRecord> {
    normalize_with_report(batch).records
}

/// Normalize a batch and report what was dropped or clamped
pub fn normalize_with_report(batch: &[RawRecord]) -> NormalizeReport {
    let mut report = NormalizeReport {
        records: Vec::with_capacity(batch.len()),
        ..Default::default()
    };

    for raw in batch {
        match coerce_record(raw) {
            Ok((record, clamped)) => {
                report.clamped += clamped;
                if record.event_type == EventType::Unknown {
                    report.unknown += 1;
                }
                report.records.push(record);
            }
            Err(e) => {
                log::debug!("Dropping raw record: {}", e);
                report.dropped += 1;
            }
        }
    }

    report
}

/// Coerce one raw record; returns the record and its clamp count
pub fn coerce_record(raw: &RawRecord) -> Result<(CanonicalRecord, usize), CoercionError> {
    let mut draft = Draft::default();

    for (key, value) in raw {
        if let Some(field) = alias::resolve(key) {
            draft.offer(field, value);
        }
    }

    draft.finish()
}

// ============================================================================
// DRAFT
// ============================================================================

#[derive(Default)]
struct Draft<'a> {
    timestamps: Vec<&'a serde_json::Value>,
    tag: Option<&'a str>,
    label: Option<String>,
    numbers: [Option<f64>; 6],
}

const NUMERIC_FIELDS: [Field; 6] = [
    Field::Confidence,
    Field::EstimatedDistanceCm,
    Field::Fps,
    Field::CpuPct,
    Field::MemPct,
    Field::TempC,
];

impl<'a> Draft<'a> {
    /// First usable value per field wins
    fn offer(&mut self, field: Field, value: &'a serde_json::Value) {
        match field {
            Field::Timestamp => {
                if !value.is_null() {
                    self.timestamps.push(value);
                }
            }
            Field::EventType => {
                if self.tag.is_none() {
                    self.tag = coerce::parse_tag(value);
                }
            }
            Field::Label => {
                if self.label.is_none() {
                    self.label = coerce::parse_label(value);
                }
            }
            numeric => {
                if let Some(idx) = NUMERIC_FIELDS.iter().position(|f| *f == numeric) {
                    if self.numbers[idx].is_none() {
                        self.numbers[idx] = coerce::parse_number(value);
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<(CanonicalRecord, usize), CoercionError> {
        let timestamp = self.resolve_timestamp()?;
        let event_type = self.tag.map(EventType::classify).unwrap_or(EventType::Unknown);

        let mut clamped = 0;
        let mut values = [None; 6];
        for (idx, field) in NUMERIC_FIELDS.iter().enumerate() {
            values[idx] = self.numbers[idx].map(|v| match FieldRange::for_field(*field) {
                Some(range) => {
                    let (v, moved) = range.clamp(v);
                    if moved {
                        clamped += 1;
                    }
                    v
                }
                None => v,
            });
        }
        let [confidence, estimated_distance_cm, fps, cpu_pct, mem_pct, temp_c] = values;

        Ok((
            CanonicalRecord {
                timestamp,
                event_type,
                label: self.label,
                confidence,
                estimated_distance_cm,
                fps,
                cpu_pct,
                mem_pct,
                temp_c,
            },
            clamped,
        ))
    }

    fn resolve_timestamp(&self) -> Result<chrono::NaiveDateTime, CoercionError> {
        let mut last_err = CoercionError::MissingTimestamp;
        for value in &self.timestamps {
            match coerce::parse_timestamp(value) {
                Ok(ts) => return Ok(ts),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}
