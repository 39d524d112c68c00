use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{CurrentView, Phase, PollState, PollStats, TickOutcome, Trigger};
use crate::logic::config::PipelineConfig;
use crate::logic::error::SourceError;
use crate::logic::fallback::SourceState;
use crate::logic::normalize::normalize_with_report;
use crate::logic::source::SourceAdapter;
use crate::logic::types::AcquisitionResult;
use crate::logic::window::{self, Streams};

/// Cheap to clone; all clones share one state and one in-flight guard
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn SourceAdapter>,
    config: PipelineConfig,
    state: RwLock<PollState>,
    in_flight: AtomicBool,
    ticks_skipped: AtomicU64,
}

/// Clears the in-flight flag on every exit path, including cancellation
struct InFlightGuard<'a> {
    inner: &'a Inner,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(inner: &'a Inner) -> Option<Self> {
        inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { inner })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.inner.state.write().stats.phase = Phase::Idle;
        self.inner.in_flight.store(false, Ordering::Release);
    }
}

impl PollScheduler {
    pub fn new(source: Arc<dyn SourceAdapter>, config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                state: RwLock::new(PollState::default()),
                in_flight: AtomicBool::new(false),
                ticks_skipped: AtomicU64::new(0),
            }),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    /// Last committed view. Never triggers a fetch.
    pub fn get_current_view(&self) -> CurrentView {
        self.inner.state.read().view()
    }

    /// Current view split by event type
    pub fn get_current_streams(&self) -> (CurrentView, Streams) {
        let view = self.get_current_view();
        let streams = window::split_by_type(&view.records);
        (view, streams)
    }

    pub fn stats(&self) -> PollStats {
        let mut stats = self.inner.state.read().stats.clone();
        stats.ticks_skipped = self.inner.ticks_skipped.load(Ordering::Relaxed);
        stats
    }

    pub fn snapshot(&self) -> PollState {
        let mut state = self.inner.state.read().clone();
        state.stats.ticks_skipped = self.inner.ticks_skipped.load(Ordering::Relaxed);
        state
    }

    // ========================================================================
    // WRITE SIDE
    // ========================================================================

    /// Run one cycle unless another is in flight
    pub async fn tick(&self, trigger: Trigger) -> TickOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.inner) else {
            self.inner.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            log::debug!("Skipping {} tick: cycle already in flight", trigger.as_str());
            return TickOutcome::Skipped;
        };

        TickOutcome::Completed(self.run_cycle(trigger).await)
    }

    async fn run_cycle(&self, trigger: Trigger) -> SourceState {
        let config = &self.inner.config;
        {
            let mut state = self.inner.state.write();
            state.stats.phase = Phase::Fetching;
            state.last_attempt = Some(Utc::now());
        }

        let fetched = match tokio::time::timeout(config.fetch_timeout, self.inner.source.fetch()).await {
            Ok(fetched) => fetched,
            Err(_) => Err(SourceError::Timeout(config.fetch_timeout)),
        };

        let mut dropped = 0;
        let mut clamped = 0;
        let result = match fetched {
            Ok(batch) => {
                let raw_count = batch.len();
                let report = normalize_with_report(&batch);
                dropped = report.dropped;
                clamped = report.clamped;
                if report.dropped > 0 {
                    log::warn!("Dropped {}/{} records with unusable timestamps", report.dropped, raw_count);
                }
                if report.clamped > 0 {
                    log::debug!("Clamped {} out-of-range values", report.clamped);
                }

                let mut records = report.records;
                if !config.assume_sorted {
                    window::sort_chronologically(&mut records);
                }
                let records = window::select(records, Utc::now().naive_utc(), config.window);
                AcquisitionResult::from_records(records)
            }
            Err(e) => AcquisitionResult::SourceUnavailable(e),
        };

        self.commit(trigger, result, dropped, clamped)
    }

    /// Single write of the cycle outcome
    fn commit(
        &self,
        trigger: Trigger,
        result: AcquisitionResult,
        dropped: usize,
        clamped: usize,
    ) -> SourceState {
        let error = match &result {
            AcquisitionResult::SourceUnavailable(e) => Some(e.to_string()),
            _ => None,
        };
        let count = result.record_count();

        let mut state = self.inner.state.write();
        let output = self.inner.config.fallback.resolve(result, &state.output);
        let source_state = output.state;

        state.output = output;
        state.stats.cycles += 1;
        state.stats.dropped += dropped as u64;
        state.stats.clamped += clamped as u64;

        match error {
            Some(error) => {
                state.stats.consecutive_failures += 1;
                log::warn!(
                    "Cycle {} ({}): source {} [{}], failure #{}",
                    state.stats.cycles,
                    trigger.as_str(),
                    source_state,
                    error,
                    state.stats.consecutive_failures
                );
                state.stats.last_error = Some(error);
            }
            None => {
                state.stats.consecutive_failures = 0;
                if source_state == SourceState::Nominal {
                    state.last_success = Some(Utc::now());
                }
                log::info!(
                    "Cycle {} ({}): source {}, {} records",
                    state.stats.cycles,
                    trigger.as_str(),
                    source_state,
                    count
                );
            }
        }

        source_state
    }

    // ========================================================================
    // LOOP
    // ========================================================================

    /// Fire a timer tick every `poll_interval`, forever
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.inner.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!(
            "Poll loop started: source={}, interval={:?}, timeout={:?}",
            self.inner.source.kind(),
            self.inner.config.poll_interval,
            self.inner.config.fetch_timeout
        );

        loop {
            interval.tick().await;
            let scheduler = self.clone();
            tokio::spawn(async move {
                scheduler.tick(Trigger::Timer).await;
            });
        }
    }

    pub fn spawn(&self) -> JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }
}
