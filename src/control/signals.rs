//! Cooperative cancellation and SIGINT/SIGTERM wiring.
//!
//! The sampling loop polls a [`CancelToken`] at sleep boundaries rather than
//! blocking on signals. A second SIGINT while the first is still pending
//! terminates the process immediately.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Uses `Ordering::Relaxed`: the loop polls it every tick and no other memory
/// is published through it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    #[cfg(feature = "signals")]
    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Routes SIGINT/SIGTERM into a [`CancelToken`].
#[cfg(feature = "signals")]
#[derive(Debug, Clone)]
pub struct SignalHandler {
    token: CancelToken,
}

#[cfg(feature = "signals")]
impl SignalHandler {
    /// Register OS signal hooks. Failures are logged to stderr but not fatal.
    #[must_use]
    pub fn install() -> Self {
        let handler = Self {
            token: CancelToken::new(),
        };
        handler.register_signals();
        handler
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    fn register_signals(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};

        // Must precede the plain registration: exit(1) only if the flag is already set.
        if let Err(e) = signal_hook::flag::register_conditional_shutdown(SIGINT, 1, self.token.flag())
        {
            eprintln!("[TGM-SIGNAL] failed to register SIGINT escalation: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, self.token.flag()) {
            eprintln!("[TGM-SIGNAL] failed to register SIGINT: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGTERM, self.token.flag()) {
            eprintln!("[TGM-SIGNAL] failed to register SIGTERM: {e}");
        }
    }
}
