//! Absolute per-request deadlines.
//!
//! A [`Deadline`] is threaded through every call that performs I/O so that
//! expiry aborts the in-flight operation instead of merely abandoning it.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// The deadline passed before the bounded operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline elapsed")]
pub struct DeadlineElapsed;

/// A fixed point in time by which a request must be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    /// Time left, zero once elapsed.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Resolves when the deadline passes.
    pub async fn elapsed(&self) {
        tokio::time::sleep_until(self.0).await
    }

    /// Run `fut` to completion or drop it when the deadline passes.
    ///
    /// Dropping the future cancels whatever I/O it had in flight.
    pub async fn bound<F>(&self, fut: F) -> Result<F::Output, DeadlineElapsed>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.0, fut)
            .await
            .map_err(|_| DeadlineElapsed)
    }
}
