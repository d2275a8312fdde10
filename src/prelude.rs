//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use tree_growth_monitor::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, TgmError};
pub use crate::core::paths::{RootKind, resolve_monitor_root};

// Control
pub use crate::control::clock::{Clock, ManualClock, SystemClock};
pub use crate::control::signals::CancelToken;

// Scanner
pub use crate::scanner::snapshot::{Snapshot, SnapshotDiff, SnapshotMode};
pub use crate::scanner::walker::{SnapshotSource, TreeWalker, WalkerConfig};

// Monitor
pub use crate::monitor::aggregate::{History, IntervalAverage, IntervalSpec, RunningTotals};
pub use crate::monitor::forecast::{GrowthForecast, Horizon, forecast};
pub use crate::monitor::sampler::{RunResult, SampleEvent, Sampler, SamplerConfig, Termination};

// Report
pub use crate::report::render::{render_census, render_growth, run_to_json};
