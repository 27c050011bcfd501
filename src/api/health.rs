//! Shared health state for the /health endpoint.
//! Updated after every upstream call made by a handler.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Outcome of the most recent upstream call.
    upstream_ok: AtomicBool,
    /// Epoch millis of the last successful upstream call (0 = none yet).
    last_success_ms: AtomicI64,
    upstream_failures: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, now_ms: i64) {
        self.upstream_ok.store(true, Ordering::Relaxed);
        self.last_success_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.upstream_ok.store(false, Ordering::Relaxed);
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_ok(&self) -> bool {
        self.upstream_ok.load(Ordering::Relaxed)
    }

    pub fn last_success_ms(&self) -> Option<i64> {
        match self.last_success_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }
}
