//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler, origin fetcher, coordinator produce:
//!     → logging.rs (structured log events, request id in the span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
