//! Field Alias Table
//!
//! Một bảng khai báo duy nhất map mọi biến thể tên cột về canonical field.
//! Lookup is case-insensitive and ignores separator style
//! (`Memory Usage`, `memory-usage` and `MEMORY_USAGE` fold to one key).

use once_cell::sync::Lazy;
use std::collections::HashMap;

// ============================================================================
// CANONICAL FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    EventType,
    Label,
    Confidence,
    EstimatedDistanceCm,
    Fps,
    CpuPct,
    MemPct,
    TempC,
}

// ============================================================================
// ALIAS TABLE
// ============================================================================

/// Every spelling observed across the feeding sources, already folded.
const ALIASES: &[(Field, &[&str])] = &[
    (
        Field::Timestamp,
        &["timestamp", "time", "ts", "datetime", "date_time", "created_at", "recorded_at", "received_time"],
    ),
    (Field::EventType, &["event_type", "eventtype", "event", "type", "kind"]),
    (Field::Label, &["label", "class", "class_name", "object", "detected_label"]),
    (Field::Confidence, &["confidence", "conf", "score", "confidence_score"]),
    (
        Field::EstimatedDistanceCm,
        &["estimated_distance_cm", "estimated_distance", "distance_cm", "distance"],
    ),
    (Field::Fps, &["fps", "frames_per_second", "frame_rate", "framerate"]),
    (Field::CpuPct, &["cpu", "cpu_pct", "cpu_percent", "cpu_usage", "cpu_load"]),
    (
        Field::MemPct,
        &["mem", "mem_pct", "memory", "memory_usage", "memory_percent", "mem_usage", "mem_percent", "ram"],
    ),
    (
        Field::TempC,
        &["temp", "temp_c", "temperature", "temperature_c", "cpu_temp", "temp_celsius"],
    ),
];

static ALIAS_INDEX: Lazy<HashMap<&'static str, Field>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for (field, aliases) in ALIASES {
        for alias in *aliases {
            m.insert(*alias, *field);
        }
    }
    m
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Fold a raw key: trim, lowercase, separators to `_`
pub fn fold_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut last_sep = false;
    for c in key.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_sep = false;
        } else if !last_sep && !out.is_empty() {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Resolve a raw key to its canonical field
pub fn resolve(key: &str) -> Option<Field> {
    ALIAS_INDEX.get(fold_key(key).as_str()).copied()
}
