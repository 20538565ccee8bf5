//! The conversion endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Response, Uri},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ErrorKind;
use crate::http::request::{request_id, ResourceRequest};
use crate::http::response::{failure_response, image_response, settle, Settlement};
use crate::imaging::DecodedImage;
use crate::observability::metrics;
use crate::pipeline::{ConversionPipeline, Failure};
use crate::resilience::{Deadline, DeadlineCoordinator};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConversionPipeline>,
    pub coordinator: DeadlineCoordinator,
    /// Per-request deadline budget.
    pub deadline: Duration,
}

/// Fetch, convert and return the resource named by the inbound path.
pub async fn convert_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response<Body> {
    let start = Instant::now();
    let request = ResourceRequest::from_uri(&uri, Deadline::after(state.deadline));
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        path = %request.path,
        deadline_ms = state.deadline.as_millis() as u64,
        "Converting origin resource"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let path = request.path.clone();
    let deadline = request.deadline;
    let resolution = state
        .coordinator
        .race(deadline, async move { pipeline.run(&path, deadline).await })
        .await;

    let settlement = settle(resolution, deadline.is_elapsed(), state.deadline);
    let result = match settlement {
        Settlement::Image(image) => encode(&state.pipeline, image).await,
        Settlement::Error(failure) => Err(failure),
    };
    let (response, outcome) = match result {
        Ok(response) => (response, "SUCCESS"),
        Err(failure) => {
            tracing::warn!(
                request_id = %request_id,
                path = %request.path,
                kind = %failure.kind,
                detail = %failure.detail,
                "Conversion failed"
            );
            (failure_response(&failure), failure.kind.as_header_value())
        }
    };

    metrics::record_request(response.status().as_u16(), outcome, start);
    tracing::info!(
        request_id = %request_id,
        path = %request.path,
        status = response.status().as_u16(),
        outcome,
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

/// Re-encode into the format the origin bytes were decoded from.
async fn encode(pipeline: &ConversionPipeline, image: DecodedImage) -> Result<Response<Body>, Failure> {
    let codec = pipeline.codec();
    let format = image.format;
    let task = tokio::task::spawn_blocking(move || codec.encode(&image.pixels, format));

    match task.await {
        Ok(Ok(bytes)) => Ok(image_response(bytes, format)),
        Ok(Err(e)) => Err(Failure::new(ErrorKind::EncodeError, e.to_string())),
        Err(e) => Err(Failure::new(
            ErrorKind::EncodeError,
            format!("encode task failed: {}", e),
        )),
    }
}
