//! Mock source
//!
//! Sinh dữ liệu giả lập (system stats + detections) để chạy dashboard khi
//! chưa có thiết bị. Values arrive as strings with units, like a real
//! device CSV would carry them.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use super::SourceAdapter;
use crate::logic::config::SourceKind;
use crate::logic::error::SourceError;
use crate::logic::types::{RawBatch, RawRecord};

pub struct MockSource {
    batch: usize,
    rng: Mutex<StdRng>,
}

impl MockSource {
    pub fn new(batch: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            batch: batch.max(1),
            rng: Mutex::new(rng),
        }
    }

    /// One batch ending now, one record per second, alternating kinds
    pub fn generate(&self) -> RawBatch {
        let now = Utc::now().naive_utc();
        let mut rng = self.rng.lock();

        (0..self.batch)
            .map(|i| {
                let at = now - Duration::seconds((self.batch - 1 - i) as i64);
                let ts = at.format("%Y-%m-%d %H:%M:%S").to_string();
                if i % 2 == 0 {
                    system_record(&mut rng, ts)
                } else {
                    detection_record(&mut rng, ts)
                }
            })
            .collect()
    }
}

fn system_record(rng: &mut StdRng, ts: String) -> RawRecord {
    as_record(json!({
        "timestamp": ts,
        "event_type": "system_stats",
        "CPU": format!("{:.1}", rng.gen_range(10.0..90.0_f64)),
        "MEM": format!("{:.1}", rng.gen_range(30.0..80.0_f64)),
        "TEMP": format!("{:.1}°C", rng.gen_range(40.0..80.0_f64)),
    }))
}

fn detection_record(rng: &mut StdRng, ts: String) -> RawRecord {
    as_record(json!({
        "timestamp": ts,
        "event_type": "detection",
        "label": "person",
        "confidence": format!("{:.2}", rng.gen_range(0.5..0.95_f64)),
        "estimated_distance_cm": format!("{:.2}", rng.gen_range(30.0..90.0_f64)),
        "FPS": format!("{:.2}", rng.gen_range(6.0..12.0_f64)),
    }))
}

fn as_record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::normalize::normalize;
    use crate::logic::types::EventType;

    #[tokio::test]
    async fn test_batch_normalizes_cleanly() {
        let source = MockSource::new(6, Some(7));
        let batch = source.fetch().await.unwrap();
        let records = normalize(&batch);

        assert_eq!(records.len(), 6);
        assert_eq!(records.iter().filter(|r| r.event_type == EventType::SystemStats).count(), 3);

        for r in records.iter().filter(|r| r.event_type == EventType::SystemStats) {
            let cpu = r.cpu_pct.unwrap();
            let temp = r.temp_c.unwrap();
            assert!((10.0..=90.0).contains(&cpu));
            assert!((40.0..=80.0).contains(&temp));
            assert!(r.fps.is_none());
        }

        for r in records.iter().filter(|r| r.event_type == EventType::Detection) {
            assert_eq!(r.label.as_deref(), Some("person"));
            assert!((0.5..=0.95).contains(&r.confidence.unwrap()));
            assert!((6.0..=12.0).contains(&r.fps.unwrap()));
        }
    }

    #[test]
    fn test_timestamps_ascending() {
        let records = normalize(&MockSource::new(4, Some(1)).generate());
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
