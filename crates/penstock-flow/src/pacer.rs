//! Uniform-rate admission — paces callers onto a shared virtual timeline.
//!
//! A request for `n` permits occupies `n / rate` seconds of virtual time.
//! While the timeline lags the wall clock the pacer admits immediately;
//! when it runs ahead, callers queue for up to `max_queueing` before being
//! rejected. Waiting callers self-serialize through atomic reservations on
//! the [`Ledger`]; there is no lock and no background timer.
//!
//! Admission order among waiting callers is whichever order reservations
//! commit in, not FIFO by arrival.

use std::sync::Arc;
use std::time::Duration;

use penstock_core::clock::{Clock, SystemClock};

use crate::ledger::Ledger;

/// Identity of the protected resource.
///
/// Decisions never depend on it; it only feeds log fields.
#[derive(Debug, Clone)]
pub struct ResourceContext {
    name: Arc<str>,
}

impl ResourceContext {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Uniform-rate admission controller for one resource.
pub struct Pacer {
    rate_per_second: f64,
    max_queueing_ms: i64,
    ledger: Ledger,
    clock: Arc<dyn Clock>,
}

impl Pacer {
    /// Pacer on the system clock.
    pub fn new(rate_per_second: f64, max_queueing: Duration) -> Self {
        Self::with_clock(rate_per_second, max_queueing, Arc::new(SystemClock))
    }

    /// Pacer on a caller-supplied clock.
    pub fn with_clock(
        rate_per_second: f64,
        max_queueing: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if rate_per_second <= 0.0 {
            tracing::warn!(
                rate_per_second,
                "non-positive rate: every request will be rejected"
            );
        }
        Self {
            rate_per_second,
            max_queueing_ms: max_queueing.as_millis().min(i64::MAX as u128) as i64,
            ledger: Ledger::new(),
            clock,
        }
    }

    /// Decide admission for `acquire` permits.
    ///
    /// Returns once the request's turn has arrived (possibly immediately),
    /// or `false` if it cannot be scheduled within the queueing bound. May
    /// suspend the calling task for up to the configured bound; a caller
    /// that drops this future mid-wait gives its reservation back.
    ///
    /// `prioritized` is carried for the caller's benefit and not yet
    /// differentiated.
    pub async fn try_admit(
        &self,
        resource: &ResourceContext,
        acquire: u32,
        prioritized: bool,
    ) -> bool {
        // A request for nothing is trivially satisfied.
        if acquire == 0 {
            return true;
        }
        // A non-positive rate has no well-defined interval; the cost
        // arithmetic below would produce garbage.
        if self.rate_per_second <= 0.0 {
            return false;
        }

        let now = self.clock.now_millis();
        let cost = self.cost_millis(acquire);
        let expected = cost.saturating_add(self.ledger.latest());

        // Fast path: the previous reservation already elapsed. Racing
        // callers may each take this branch and re-arm the cursor; see
        // Ledger::reset_to.
        if expected <= now {
            self.ledger.reset_to(now);
            return true;
        }

        let wait = expected.saturating_sub(now);
        if wait > self.max_queueing_ms {
            tracing::debug!(
                resource = resource.name(),
                acquire,
                prioritized,
                wait_ms = wait,
                max_ms = self.max_queueing_ms,
                "rejected: queueing bound exceeded"
            );
            return false;
        }

        // Claim the interval, then re-check against a fresh clock read:
        // other callers may have pushed the cursor past the bound between
        // the optimistic check above and the fetch-add.
        let claim = self.ledger.claim(cost);
        let wait = claim
            .reserved_until()
            .saturating_sub(self.clock.now_millis());
        if wait > self.max_queueing_ms {
            tracing::debug!(
                resource = resource.name(),
                acquire,
                prioritized,
                wait_ms = wait,
                max_ms = self.max_queueing_ms,
                "rejected after reserving: queueing bound exceeded, rolling back"
            );
            // Dropping the uncommitted claim returns the capacity.
            return false;
        }

        // Negative waits happen when the scheduled moment passed between
        // the two clock reads, or on backward clock jitter. Already due.
        if wait > 0 {
            tracing::trace!(
                resource = resource.name(),
                acquire,
                prioritized,
                wait_ms = wait,
                "queueing until reserved slot"
            );
            tokio::time::sleep(Duration::from_millis(wait as u64)).await;
        }
        claim.commit();
        true
    }

    /// Virtual time up to which capacity is committed. Diagnostic.
    pub fn latest_reserved_ms(&self) -> i64 {
        self.ledger.latest()
    }

    /// Virtual-time interval `acquire` permits occupy, in milliseconds,
    /// rounded to nearest.
    fn cost_millis(&self, acquire: u32) -> i64 {
        (1000.0 * f64::from(acquire) / self.rate_per_second).round() as i64
    }
}
