//! Deadline-bounded grayscale image proxy.
//!
//! Every inbound GET is forwarded to a single origin. The returned image is
//! decoded, converted to grayscale and re-encoded in its original format.
//! A request that cannot be answered before its deadline gets a 408.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod imaging;
pub mod origin;
pub mod pipeline;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
