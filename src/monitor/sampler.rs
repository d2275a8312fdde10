//! Sampling loop: drives a snapshot source at a fixed cadence for a bounded
//! window, folding each tick into history and running totals.
//!
//! Cancellation is observed only at sleep boundaries; a snapshot in progress
//! always completes. The loop owns all mutable run state and seals it into an
//! immutable [`RunResult`] on termination.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::control::clock::Clock;
use crate::control::signals::CancelToken;
use crate::core::errors::{Result, TgmError};
use crate::monitor::aggregate::{
    History, IntervalAverage, IntervalSpec, RunningTotals, SnapshotDelta, interval_averages,
};
use crate::monitor::forecast::{ChurnRates, GrowthForecast};
use crate::scanner::snapshot::{Snapshot, SnapshotDiff, SnapshotMode};
use crate::scanner::walker::SnapshotSource;

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub cadence: Duration,
    pub max_duration: Duration,
    pub intervals: IntervalSpec,
}

impl SamplerConfig {
    pub fn new(cadence: Duration, max_duration: Duration, intervals: IntervalSpec) -> Result<Self> {
        if cadence.is_zero() {
            return Err(TgmError::InvalidConfig {
                details: "sampling cadence must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            cadence,
            max_duration,
            intervals,
        })
    }

    /// Window length from fractional hours or minutes; rejects negative or non-finite input.
    pub fn duration_from_secs(seconds: f64) -> Result<Duration> {
        Duration::try_from_secs_f64(seconds).map_err(|_| TgmError::InvalidConfig {
            details: format!("monitoring duration must be a non-negative number, got {seconds}s"),
        })
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Completed,
    Cancelled,
}

/// Per-tick progress notification.
#[derive(Debug, Clone)]
pub struct SampleEvent {
    pub tick: u64,
    pub offset: Duration,
    pub file_count: u64,
    pub total_bytes: Option<u64>,
    /// Diff against the previous tick (membership mode, tick > 0).
    pub diff: Option<SnapshotDiff>,
    /// Set when the root could not be read and a zeroed snapshot was recorded.
    pub error: Option<String>,
}

/// Sealed outcome of one monitoring run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub root: PathBuf,
    pub mode: SnapshotMode,
    pub start_snapshot: Snapshot,
    pub end_snapshot: Snapshot,
    pub start_time: Instant,
    pub end_time: Instant,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub history: History,
    /// `Some` only in membership mode.
    pub running_totals: Option<RunningTotals>,
    pub interval_averages: Vec<IntervalAverage>,
    pub termination: Termination,
    pub ticks: u64,
    pub path_errors: u64,
}

impl RunResult {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.end_time.saturating_duration_since(self.start_time)
    }

    #[must_use]
    pub fn delta(&self) -> SnapshotDelta {
        SnapshotDelta::between(&self.start_snapshot, &self.end_snapshot)
    }

    #[must_use]
    pub fn forecast(&self) -> GrowthForecast {
        let delta = self.delta();
        GrowthForecast::new(delta.net_bytes, delta.net_files, self.elapsed().as_secs_f64())
    }

    #[must_use]
    pub fn churn(&self) -> Option<ChurnRates> {
        self.running_totals
            .map(|t| ChurnRates::new(t.added, t.removed, self.elapsed().as_secs_f64()))
    }

    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

type Observer<'a> = Box<dyn FnMut(&SampleEvent) + 'a>;

/// The sampling loop.
pub struct Sampler<'a> {
    config: SamplerConfig,
    observer: Option<Observer<'a>>,
}

impl<'a> Sampler<'a> {
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&SampleEvent) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Run until `max_duration` elapses or `cancel` is set.
    ///
    /// `ticks` counts only samples accepted into the history.
    pub fn run(
        &mut self,
        source: &dyn SnapshotSource,
        clock: &dyn Clock,
        cancel: &CancelToken,
    ) -> RunResult {
        let mode = source.mode();
        let start_time = clock.now();
        let started_at = clock.wall_now();
        let mut history = History::new(start_time);
        let mut running_totals = (mode == SnapshotMode::Membership).then(RunningTotals::default);
        let mut path_errors = 0_u64;

        let (first, error) = self.take_snapshot(source, &mut path_errors);
        history.record(start_time, first.file_count());
        self.notify(0, Duration::ZERO, &first, None, error);

        let start_snapshot = first.clone();
        let mut previous = first;
        let mut tick = 0_u64;
        let mut termination = Termination::Completed;

        loop {
            if cancel.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }
            let elapsed = clock.now().saturating_duration_since(start_time);
            if elapsed >= self.config.max_duration {
                break;
            }
            clock.sleep(self.config.cadence.min(self.config.max_duration - elapsed));
            if cancel.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }

            let taken_at = clock.now();
            let (snapshot, error) = self.take_snapshot(source, &mut path_errors);
            // A sample whose timestamp did not advance is dropped entirely.
            if !history.record(taken_at, snapshot.file_count()) {
                eprintln!(
                    "[TGM-SAMPLER] discarding sample after tick {tick}: timestamp did not advance"
                );
                continue;
            }
            tick += 1;

            let diff = match (
                running_totals.as_mut(),
                previous.as_membership(),
                snapshot.as_membership(),
            ) {
                (Some(totals), Some(before), Some(after)) => {
                    let diff = before.diff(after);
                    totals.fold(diff);
                    Some(diff)
                }
                _ => None,
            };

            let offset = taken_at.saturating_duration_since(start_time);
            self.notify(tick, offset, &snapshot, diff, error);
            previous = snapshot;
        }

        let end_time = clock.now();
        let ended_at = clock.wall_now();
        let interval_averages = interval_averages(&history, &self.config.intervals);

        RunResult {
            root: source.root().to_path_buf(),
            mode,
            start_snapshot,
            end_snapshot: previous,
            start_time,
            end_time,
            started_at,
            ended_at,
            history,
            running_totals,
            interval_averages,
            termination,
            ticks: tick + 1,
            path_errors,
        }
    }

    fn take_snapshot(
        &self,
        source: &dyn SnapshotSource,
        path_errors: &mut u64,
    ) -> (Snapshot, Option<String>) {
        match source.collect() {
            Ok(snapshot) => (snapshot, None),
            Err(err) => {
                *path_errors += 1;
                eprintln!("[TGM-SAMPLER] WARNING: {err}; recording empty snapshot");
                (Snapshot::empty(source.mode()), Some(err.to_string()))
            }
        }
    }

    fn notify(
        &mut self,
        tick: u64,
        offset: Duration,
        snapshot: &Snapshot,
        diff: Option<SnapshotDiff>,
        error: Option<String>,
    ) {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        observer(&SampleEvent {
            tick,
            offset,
            file_count: snapshot.file_count(),
            total_bytes: snapshot.total_bytes(),
            diff,
            error,
        });
    }
}
