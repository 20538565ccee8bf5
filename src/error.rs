//! Error taxonomy and plain-text error responses.
//!
//! Every failure a request can end in maps to exactly one [`ErrorKind`],
//! and every kind maps to exactly one status code. None of them are fatal
//! to the process.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

/// Header carrying the machine-readable error code.
pub const X_PROXY_ERROR: &str = "x-proxy-error";

/// Terminal failure classes for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fetch-level network or cancellation failure.
    Transport,
    /// Origin reachable but answered with a non-success status.
    OriginError,
    /// Payload is not a recognised or parsable image.
    DecodeError,
    /// Transformed image could not be serialised.
    EncodeError,
    /// Deadline elapsed before the pipeline resolved.
    Timeout,
}

impl ErrorKind {
    /// HTTP status returned to the caller for this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::Transport => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::OriginError => StatusCode::BAD_REQUEST,
            ErrorKind::DecodeError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::EncodeError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Stable code for the `X-Proxy-Error` header and metric labels.
    pub fn as_header_value(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::OriginError => "ORIGIN_ERROR",
            ErrorKind::DecodeError => "DECODE_ERROR",
            ErrorKind::EncodeError => "ENCODE_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_header_value())
    }
}

/// Build a plain-text error response for `kind` with `message` as the body.
pub fn text_error_response(kind: ErrorKind, message: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(message.into()));
    *response.status_mut() = kind.status_code();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_PROXY_ERROR, HeaderValue::from_static(kind.as_header_value()));
    response
}
