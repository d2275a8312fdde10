//! Time source for the sampling loop.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;

/// Monotonic time, wall-clock time, and sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn wall_now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

type SleepHook = Box<dyn Fn(Duration) + Send + Sync>;

struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Deterministic clock: `sleep` advances time instantly instead of blocking.
///
/// An optional hook runs after every sleep with the new elapsed offset, which
/// lets tests mutate the filesystem or cancel between ticks.
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Local>,
    state: Mutex<ManualState>,
    on_sleep: Option<SleepHook>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            wall_origin: Local::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                sleeps: Vec::new(),
            }),
            on_sleep: None,
        }
    }

    #[must_use]
    pub fn with_sleep_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.on_sleep = Some(Box::new(hook));
        self
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        state.elapsed = state.elapsed.saturating_add(by);
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Every duration passed to `sleep`, in call order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("elapsed", &self.elapsed())
            .field("has_hook", &self.on_sleep.is_some())
            .finish_non_exhaustive()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall_now(&self) -> DateTime<Local> {
        let offset = chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::MAX);
        self.wall_origin
            .checked_add_signed(offset)
            .unwrap_or(self.wall_origin)
    }

    fn sleep(&self, duration: Duration) {
        let elapsed = {
            let mut state = self.state.lock();
            state.elapsed = state.elapsed.saturating_add(duration);
            state.sleeps.push(duration);
            state.elapsed
        };
        // Lock released: the hook may call back into the clock.
        if let Some(hook) = &self.on_sleep {
            hook(elapsed);
        }
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall_now(&self) -> DateTime<Local> {
        (**self).wall_now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
