//! Poll Scheduler
//!
//! Drives acquisition cycles: `Idle -> Fetching -> (Nominal|Degraded|Unavailable) -> Idle`.
//!
//! ## Guarantees
//! - At most one cycle in flight; a tick arriving mid-cycle is dropped
//! - The adapter call is bounded by `fetch_timeout`
//! - Readers only ever see a fully committed cycle

mod scheduler;

pub use scheduler::PollScheduler;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::fallback::{ResolvedOutput, SourceState};
use super::types::CanonicalRecord;

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
}

/// What fired a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Timer => "timer",
            Trigger::Manual => "manual",
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "state", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A cycle ran and committed this state
    Completed(SourceState),
    /// Another cycle was in flight
    Skipped,
}

/// Loop counters, exposed read-only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollStats {
    pub cycles: u64,
    pub ticks_skipped: u64,
    /// Records dropped by coercion (cumulative)
    pub dropped: u64,
    /// Values clamped into range (cumulative)
    pub clamped: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub phase: Phase,
}

/// Everything the scheduler owns between cycles
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub output: ResolvedOutput,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub stats: PollStats,
}

/// Read model for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub records: Arc<Vec<CanonicalRecord>>,
    pub state: SourceState,
    pub last_success: Option<DateTime<Utc>>,
    /// `records` belong to an earlier cycle
    pub stale: bool,
}

impl PollState {
    pub fn view(&self) -> CurrentView {
        CurrentView {
            records: self.output.records.clone(),
            state: self.output.state,
            last_success: self.last_success,
            stale: self.output.stale,
        }
    }
}
