//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → deadline.rs (fix an absolute deadline for the whole request)
//!     → coordinator.rs (spawn the pipeline, race it against the deadline)
//!         → pipeline I/O bounded by the same deadline
//!     → Resolution: Completed | TimedOut | Abandoned
//! ```
//!
//! Every external call has a deadline. Nothing is retried.

pub mod coordinator;
pub mod deadline;

pub use coordinator::{DeadlineCoordinator, InFlight, Resolution};
pub use deadline::{Deadline, DeadlineElapsed};
