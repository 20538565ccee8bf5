//! Fetch → status check → decode → transform.
//!
//! The pipeline owns the origin body from the moment the fetch returns and
//! consumes it exactly once on every path, so the underlying connection is
//! always either returned to the pool or closed.

use axum::body::{Body, Bytes};
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::imaging::{Codec, DecodedImage, Transform};
use crate::origin::{error_chain, FetchError, OriginFetcher, OriginResponse};
use crate::pipeline::outcome::ConversionOutcome;
use crate::resilience::Deadline;

pub struct ConversionPipeline {
    fetcher: OriginFetcher,
    codec: Arc<dyn Codec>,
    transform: Arc<dyn Transform>,
    max_body_bytes: usize,
}

impl ConversionPipeline {
    pub fn new(
        fetcher: OriginFetcher,
        codec: Arc<dyn Codec>,
        transform: Arc<dyn Transform>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            fetcher,
            codec,
            transform,
            max_body_bytes,
        }
    }

    /// Codec used for decoding; the handler re-encodes with the same one.
    pub fn codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.codec)
    }

    /// Fetch `path` from the origin and convert whatever comes back.
    pub async fn run(&self, path: &str, deadline: Deadline) -> ConversionOutcome {
        let fetched = self.fetcher.fetch(path, deadline).await;
        self.convert(fetched, deadline).await
    }

    /// Turn a fetch result into an outcome.
    pub async fn convert(
        &self,
        fetched: Result<OriginResponse, FetchError>,
        deadline: Deadline,
    ) -> ConversionOutcome {
        let response = match fetched {
            Ok(response) => response,
            Err(e) => return ConversionOutcome::failure(ErrorKind::Transport, e.to_string()),
        };

        if !response.status.is_success() {
            // Surface the origin's own message, not its status code.
            let detail = match self.read_body(response.body, deadline).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(detail) => detail,
            };
            tracing::debug!(status = %response.status, "Origin returned non-success status");
            return ConversionOutcome::failure(ErrorKind::OriginError, detail);
        }

        match self.read_body(response.body, deadline).await {
            Ok(bytes) => self.decode_and_transform(bytes).await,
            Err(detail) => ConversionOutcome::failure(ErrorKind::Transport, detail),
        }
    }

    async fn read_body(&self, body: Body, deadline: Deadline) -> Result<Bytes, String> {
        match deadline
            .bound(axum::body::to_bytes(body, self.max_body_bytes))
            .await
        {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(format!("failed to read origin body: {}", error_chain(&e))),
            Err(elapsed) => Err(format!("failed to read origin body: {}", elapsed)),
        }
    }

    /// Decode and transform off the async workers; both are CPU-bound.
    async fn decode_and_transform(&self, bytes: Bytes) -> ConversionOutcome {
        let codec = Arc::clone(&self.codec);
        let transform = Arc::clone(&self.transform);

        let task = tokio::task::spawn_blocking(move || {
            codec.decode(&bytes).map(|decoded| DecodedImage {
                pixels: transform.apply(&decoded.pixels),
                format: decoded.format,
            })
        });

        match task.await {
            Ok(Ok(image)) => ConversionOutcome::Success(image),
            Ok(Err(e)) => ConversionOutcome::failure(ErrorKind::DecodeError, e.to_string()),
            Err(e) => ConversionOutcome::failure(
                ErrorKind::DecodeError,
                format!("decode task failed: {}", e),
            ),
        }
    }
}
