//! Process-wide "do not start" flag.
//!
//! The Ctrl-C handler sets it; the orchestrator checks it once, right before
//! Execute. A swap already executing always runs to completion, since
//! stopping halfway would leave the pair inconsistent.
//!
//! Relaxed atomics are sufficient for a one-way flag, and `request()` is safe
//! to call from a signal handler.
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Ask that no new work be started (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
