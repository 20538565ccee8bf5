//! Upstream origin access.
//!
//! One shared, pooled HTTP client talks to one fixed origin. Every call
//! takes the request's [`Deadline`](crate::resilience::Deadline) so that
//! expiry aborts the network I/O itself.

pub mod fetcher;

pub use fetcher::{build_client, error_chain, FetchError, OriginClient, OriginFetcher, OriginResponse};
