//! Races background work against a deadline.
//!
//! # State machine (per call)
//! ```text
//! Pending ──(result received)──▶ Resolved(Completed)
//!    └─────(deadline elapsed)──▶ Resolved(TimedOut)
//! ```
//!
//! The work runs on its own task and reports through a single-slot
//! `oneshot`. Sending on a oneshot never blocks, so a worker that finishes
//! after the caller has already timed out drops its result and exits.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::observability::metrics;
use crate::resilience::deadline::Deadline;

/// Outcome of a single race. Exactly one is produced per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The work finished first.
    Completed(T),
    /// The deadline passed first.
    TimedOut,
    /// The worker ended without reporting (it panicked).
    Abandoned,
}

/// Count of worker tasks that are still alive.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn current(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> InFlightGuard {
        let now = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_in_flight(now);
        InFlightGuard(Arc::clone(&self.0))
    }
}

/// Decrements the in-flight count when the worker task ends, however it ends.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.0.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_in_flight(now);
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeadlineCoordinator {
    in_flight: InFlight,
}

impl DeadlineCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the live worker count.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Spawn `work` and wait for whichever comes first: its result or `deadline`.
    ///
    /// Returns as soon as the first event fires. When the deadline wins the
    /// worker keeps running until its own I/O observes the same deadline;
    /// its result is then discarded.
    pub async fn race<F, T>(&self, deadline: Deadline, work: F) -> Resolution<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let guard = self.in_flight.enter();

        tokio::spawn(async move {
            let _guard = guard;
            let result = work.await;
            if tx.send(result).is_err() {
                tracing::debug!("Caller already resolved; discarding late result");
            }
        });

        tokio::select! {
            biased;
            _ = deadline.elapsed() => Resolution::TimedOut,
            received = rx => match received {
                Ok(result) => Resolution::Completed(result),
                Err(_) => Resolution::Abandoned,
            },
        }
    }
}
