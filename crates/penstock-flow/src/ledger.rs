//! The ledger — a single shared virtual-time cursor.
//!
//! Holds the virtual timestamp (milliseconds) up to which admitted work has
//! already consumed capacity. All mutation is atomic; there is no lock.
//! Callers claim an interval with [`Ledger::claim`] and either commit it or
//! let the claim drop, which returns the capacity to the cursor.

use std::sync::atomic::{AtomicI64, Ordering};

/// Cursor value meaning "no reservation yet", infinitely in the past.
pub const IDLE: i64 = -1;

#[derive(Debug)]
pub struct Ledger {
    latest_reserved_ms: AtomicI64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            latest_reserved_ms: AtomicI64::new(IDLE),
        }
    }

    /// Current cursor position.
    pub fn latest(&self) -> i64 {
        self.latest_reserved_ms.load(Ordering::Acquire)
    }

    /// Re-arm the cursor at `now_ms`.
    ///
    /// A plain store, not a compare-exchange: racing callers that each saw
    /// idle capacity will each land here, and the last store wins. That
    /// brief over-admission is accepted; the long-run rate still holds.
    pub fn reset_to(&self, now_ms: i64) {
        self.latest_reserved_ms.store(now_ms, Ordering::Release);
    }

    /// Atomically claim `cost_ms` of capacity.
    ///
    /// Concurrent claims compose through the fetch-add; each caller learns
    /// the virtual time at which its own interval ends. The claim must be
    /// committed once the caller is through; dropping it uncommitted
    /// returns the capacity.
    pub fn claim(&self, cost_ms: i64) -> Claim<'_> {
        let reserved_until = self
            .latest_reserved_ms
            .fetch_add(cost_ms, Ordering::AcqRel)
            .saturating_add(cost_ms);
        Claim {
            ledger: self,
            cost_ms,
            reserved_until,
            committed: false,
        }
    }

    fn release(&self, cost_ms: i64) {
        self.latest_reserved_ms.fetch_sub(cost_ms, Ordering::AcqRel);
    }
}

/// A tentative hold on `cost_ms` of ledger capacity.
///
/// Rolls the cursor back on drop unless [`commit`](Claim::commit) was
/// called. This covers both the bound re-check failing and the holder's
/// future being cancelled while it sleeps.
#[derive(Debug)]
pub struct Claim<'a> {
    ledger: &'a Ledger,
    cost_ms: i64,
    reserved_until: i64,
    committed: bool,
}

impl Claim<'_> {
    /// Virtual time at which this claim's interval ends.
    pub fn reserved_until(&self) -> i64 {
        self.reserved_until
    }

    /// Keep the claimed capacity.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.ledger.release(self.cost_ms);
        }
    }
}
