//! Online reduction of snapshots: sample history, running churn totals,
//! windowed averages, and start/end deltas.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::errors::{Result, TgmError};
use crate::scanner::snapshot::{Snapshot, SnapshotDiff};

/// One retained observation: when it was taken and how many files it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: Instant,
    pub file_count: u64,
}

/// Append-only, strictly time-ordered sample history anchored at the run start.
#[derive(Debug, Clone)]
pub struct History {
    start: Instant,
    entries: Vec<HistoryEntry>,
}

impl History {
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            entries: Vec::new(),
        }
    }

    /// Append a sample. Returns `false` (and drops the sample) if `timestamp`
    /// is not strictly after the previous entry or precedes the run start.
    pub fn record(&mut self, timestamp: Instant, file_count: u64) -> bool {
        if timestamp < self.start {
            return false;
        }
        if let Some(last) = self.entries.last()
            && timestamp <= last.timestamp
        {
            return false;
        }
        self.entries.push(HistoryEntry {
            timestamp,
            file_count,
        });
        true
    }

    #[must_use]
    pub fn start(&self) -> Instant {
        self.start
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean file count over entries whose offset from the start is `<= window`.
    ///
    /// `None` when no entry falls inside the window.
    #[must_use]
    pub fn window_average(&self, window: Duration) -> Option<(f64, usize)> {
        let (sum, n) = self
            .entries
            .iter()
            .filter(|entry| entry.timestamp.duration_since(self.start) <= window)
            .fold((0.0_f64, 0_usize), |(sum, n), entry| {
                (sum + entry.file_count as f64, n + 1)
            });
        (n > 0).then(|| (sum / n as f64, n))
    }
}

/// Monotonic added/removed counters folded from consecutive snapshot diffs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunningTotals {
    pub added: u64,
    pub removed: u64,
}

impl RunningTotals {
    pub fn fold(&mut self, diff: SnapshotDiff) {
        self.added = self.added.saturating_add(diff.added);
        self.removed = self.removed.saturating_add(diff.removed);
    }
}

/// Caller-supplied "first N minutes" windows for average file counts.
///
/// Stored ascending; duplicates are kept and each is answered independently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalSpec {
    minutes: Vec<f64>,
}

impl IntervalSpec {
    /// Validate boundaries: each must be finite and strictly positive.
    pub fn new(minutes: &[f64]) -> Result<Self> {
        if let Some(bad) = minutes.iter().find(|m| !m.is_finite() || **m <= 0.0) {
            return Err(TgmError::InvalidConfig {
                details: format!("interval boundaries must be positive minutes, got {bad}"),
            });
        }
        let mut sorted = minutes.to_vec();
        sorted.sort_by(f64::total_cmp);
        Ok(Self { minutes: sorted })
    }

    #[must_use]
    pub fn minutes(&self) -> &[f64] {
        &self.minutes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}

/// Average file count for one interval boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalAverage {
    pub minutes: f64,
    /// `None` means no sample fell inside the window ("unavailable").
    pub average: Option<f64>,
    pub samples: usize,
}

/// Evaluate every interval boundary against the history.
#[must_use]
pub fn interval_averages(history: &History, spec: &IntervalSpec) -> Vec<IntervalAverage> {
    spec.minutes()
        .iter()
        .map(|&minutes| {
            // Windows beyond `Duration::MAX` cover the whole run.
            let window = Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX);
            let (average, samples) = history
                .window_average(window)
                .map_or((None, 0), |(avg, n)| (Some(avg), n));
            IntervalAverage {
                minutes,
                average,
                samples,
            }
        })
        .collect()
}

/// Signed start-to-end change, computed once at finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDelta {
    /// `None` for membership snapshots, which do not measure size.
    pub net_bytes: Option<i64>,
    pub net_files: i64,
}

impl SnapshotDelta {
    #[must_use]
    pub fn between(start: &Snapshot, end: &Snapshot) -> Self {
        let net_bytes = match (start.total_bytes(), end.total_bytes()) {
            (Some(a), Some(b)) => Some(signed_delta(a, b)),
            _ => None,
        };
        Self {
            net_bytes,
            net_files: signed_delta(start.file_count(), end.file_count()),
        }
    }
}

/// `end - start` as a signed value, saturating at the `i64` range.
#[must_use]
pub fn signed_delta(start: u64, end: u64) -> i64 {
    let diff = i128::from(end) - i128::from(start);
    i64::try_from(diff).unwrap_or(if diff.is_negative() { i64::MIN } else { i64::MAX })
}
