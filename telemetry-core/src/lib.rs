//! Telemetry Core - acquisition & normalization pipeline
//!
//! Pulls raw records from one configured source, normalizes them into
//! `CanonicalRecord`s, windows them, and keeps the last committed view
//! for the presentation layer.

pub mod constants;
pub mod logic;

pub use logic::config::{PipelineConfig, SourceConfig, SourceKind};
pub use logic::error::{CoercionError, ConfigError, IngestError, SourceError};
pub use logic::fallback::{FallbackPolicy, ResolvedOutput, SourceState};
pub use logic::poll::{CurrentView, Phase, PollScheduler, PollState, PollStats, TickOutcome, Trigger};
pub use logic::source::{PushBuffer, PushReceipt, SourceAdapter, Sources, UploadSource, UploadSummary};
pub use logic::types::{AcquisitionResult, CanonicalRecord, EventType, RawBatch, RawRecord};
pub use logic::window::{StreamSummary, Streams};
