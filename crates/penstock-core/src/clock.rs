//! Time sources for admission arithmetic.
//!
//! The pacer does all of its math in integer milliseconds read from a
//! caller-supplied clock. Production code uses [`SystemClock`]; tests and
//! simulations drive a [`ManualClock`] by hand.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock source.
///
/// Readings are expected to be non-decreasing. Small backward jitter is
/// tolerated downstream (computed waits clamp at zero), so implementations
/// don't need to enforce monotonicity themselves.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Unix-epoch milliseconds via `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Hand-driven clock: starts at a fixed instant and only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::Release);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now_ms.load(Ordering::Acquire)
    }
}
