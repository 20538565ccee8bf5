//! The single result a conversion produces.

use crate::error::ErrorKind;
use crate::imaging::DecodedImage;

/// A terminal failure with a human-readable detail for the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Produced once per request, consumed once by the handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// Transformed pixels tagged with the format they were decoded from.
    Success(DecodedImage),
    Failure(Failure),
}

impl ConversionOutcome {
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        ConversionOutcome::Failure(Failure::new(kind, detail))
    }
}
