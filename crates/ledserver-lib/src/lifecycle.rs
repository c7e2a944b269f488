//! Lifecycle state and observability counters.
//!
//! The process has exactly two states: running and stopping. The transition
//! happens once, is idempotent, and is the only piece of shared mutable
//! state in the system — an atomic flag that a signal handler may set but
//! never act on. All cleanup happens on the main thread after the flag is
//! observed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// Cooperative shutdown flag, cheap to clone into a signal handler.
///
/// Starts in the running state. [`request_stop`](ShutdownFlag::request_stop)
/// is async-signal-safe: it only stores into an atomic, no I/O, no
/// allocation, no hardware calls.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to stopping. Repeated calls have no additional effect.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Checked once per loop iteration by the serve loop.
    pub fn is_running(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

/// Counters for one serve run, reported on clean shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Datagrams received, well-formed or not.
    pub received: u64,
    /// Updates whose pixel write landed.
    pub applied: u64,
    /// Updates dropped for an out-of-range index. Expected under adversarial
    /// or misconfigured senders; not an error.
    pub ignored: u64,
    /// Datagrams discarded by the decoder.
    pub rejected: u64,
    /// Successful hardware commits during the loop (startup and shutdown
    /// renders are not counted).
    pub renders: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} messages ({} applied, {} ignored, {} rejected), {} renders",
            self.received, self.applied, self.ignored, self.rejected, self.renders
        )
    }
}
