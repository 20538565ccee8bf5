//! Outcome → HTTP response mapping.
//!
//! | Settlement                       | Status | Body                |
//! |----------------------------------|--------|---------------------|
//! | Timeout                          | 408    | timeout description |
//! | Transport / DecodeError          | 500    | message             |
//! | OriginError                      | 400    | origin's own body   |
//! | Image, encode ok                 | 200    | encoded bytes       |
//! | Image, encode failed             | 500    | message             |

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use image::ImageFormat;
use std::time::Duration;

use crate::error::{text_error_response, ErrorKind};
use crate::imaging::{content_type, DecodedImage};
use crate::pipeline::{ConversionOutcome, Failure};
use crate::resilience::Resolution;

/// What the handler will answer with, before any encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Image(DecodedImage),
    Error(Failure),
}

/// Collapse a coordinator resolution into exactly one settlement.
///
/// A transport failure observed once the deadline has passed is reported as
/// a timeout.
pub fn settle(
    resolution: Resolution<ConversionOutcome>,
    deadline_elapsed: bool,
    budget: Duration,
) -> Settlement {
    match resolution {
        Resolution::TimedOut => Settlement::Error(timeout_failure(budget)),
        Resolution::Completed(ConversionOutcome::Failure(failure))
            if failure.kind == ErrorKind::Transport && deadline_elapsed =>
        {
            Settlement::Error(timeout_failure(budget))
        }
        Resolution::Completed(ConversionOutcome::Failure(failure)) => Settlement::Error(failure),
        Resolution::Completed(ConversionOutcome::Success(image)) => Settlement::Image(image),
        Resolution::Abandoned => Settlement::Error(Failure::new(
            ErrorKind::Transport,
            "conversion ended without producing a result",
        )),
    }
}

fn timeout_failure(budget: Duration) -> Failure {
    Failure::new(
        ErrorKind::Timeout,
        format!(
            "deadline of {}ms elapsed before the origin image was converted",
            budget.as_millis()
        ),
    )
}

pub fn failure_response(failure: &Failure) -> Response<Body> {
    text_error_response(failure.kind, failure.detail.clone())
}

/// 200 with the encoded image, its MIME type and exact length.
pub fn image_response(bytes: Vec<u8>, format: ImageFormat) -> Response<Body> {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(format)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}
