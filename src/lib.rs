#![forbid(unsafe_code)]

//! Tree Growth Monitor (tgm): periodically samples a filesystem subtree and
//! reports how its size, file count, and membership change over a bounded
//! monitoring window.
//!
//! Pipeline:
//! 1. **Snapshot collection** — aggregate byte/file totals or full file-identity sets
//! 2. **Sampling loop** — fixed cadence, bounded duration, cooperative cancellation
//! 3. **Aggregation** — running added/removed totals, windowed averages, start/end deltas
//! 4. **Forecasting** — linear extrapolation over 1 day / 30 days / 1 year
//!
//! # Library usage
//!
//! ```rust,no_run
//! use tree_growth_monitor::prelude::*;
//!
//! let walker = TreeWalker::new(WalkerConfig {
//!     root: "/var/log".into(),
//!     recursive: true,
//!     mode: SnapshotMode::Aggregate,
//!     parallelism: 2,
//! });
//! let config = SamplerConfig::new(
//!     std::time::Duration::from_secs(1),
//!     std::time::Duration::from_secs(10),
//!     IntervalSpec::default(),
//! )?;
//! let result = Sampler::new(config).run(&walker, &SystemClock, &CancelToken::new());
//! println!("{}", render_growth(&result));
//! # Ok::<(), TgmError>(())
//! ```

pub mod prelude;

pub mod control;
pub mod core;
pub mod logger;
pub mod monitor;
pub mod report;
pub mod scanner;
