//! Single-attempt GET against the configured origin.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::{OriginConfig, TimeoutConfig};
use crate::observability::metrics;
use crate::resilience::Deadline;

/// Pooled client shared by every request. Cloning is cheap.
pub type OriginClient = Client<HttpConnector, Body>;

/// Status and unread body returned by the origin.
///
/// The body is owned here until the conversion pipeline consumes it.
#[derive(Debug)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub body: Body,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid origin url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("origin request cancelled: deadline elapsed")]
    DeadlineElapsed,
    #[error("origin request failed: {0}")]
    Request(String),
}

/// Render an error with its whole source chain, e.g. `client error (Connect): connection refused`.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Build the process-wide origin client.
pub fn build_client(origin: &OriginConfig, timeouts: &TimeoutConfig) -> OriginClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(timeouts.connect()));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(origin.pool_idle_timeout_secs))
        .build(connector)
}

/// Issues requests to `<origin><path>`.
#[derive(Debug, Clone)]
pub struct OriginFetcher {
    client: OriginClient,
    base: String,
}

impl OriginFetcher {
    pub fn new(client: OriginClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(origin: &OriginConfig, timeouts: &TimeoutConfig) -> Self {
        Self::new(build_client(origin, timeouts), origin.base())
    }

    /// Full upstream URL for an inbound path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Send one GET for `path`. No retries.
    ///
    /// If `deadline` passes while waiting for the response head, the request
    /// future is dropped, which tears down its connection.
    pub async fn fetch(&self, path: &str, deadline: Deadline) -> Result<OriginResponse, FetchError> {
        let url = self.url_for(path);
        let uri: Uri = url.parse().map_err(|e: axum::http::uri::InvalidUri| {
            FetchError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| FetchError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let start = Instant::now();
        let result = match deadline.bound(self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(FetchError::Request(error_chain(&e))),
            Err(_) => Err(FetchError::DeadlineElapsed),
        };
        metrics::record_origin_fetch(start, result.is_ok());

        let response = result.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Origin fetch failed");
            e
        })?;
        tracing::debug!(url = %url, status = %response.status(), "Origin responded");

        let (parts, body) = response.into_parts();
        Ok(OriginResponse {
            status: parts.status,
            body: Body::new(body),
        })
    }
}
