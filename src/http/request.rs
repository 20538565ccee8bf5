//! Inbound request identity.
//!
//! # Responsibilities
//! - Carry the `x-request-id` assigned at the edge into logs
//! - Build the per-request [`ResourceRequest`] (path + deadline)

use axum::http::{HeaderMap, Uri};

use crate::resilience::Deadline;

/// Header name for request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// What to fetch and when the answer is due. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Inbound path plus query string, forwarded verbatim.
    pub path: String,
    pub deadline: Deadline,
}

impl ResourceRequest {
    pub fn new(path: impl Into<String>, deadline: Deadline) -> Self {
        Self {
            path: path.into(),
            deadline,
        }
    }

    pub fn from_uri(uri: &Uri, deadline: Deadline) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Self::new(path, deadline)
    }
}
