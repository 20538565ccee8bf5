//! Conversion pipeline.
//!
//! # Data Flow
//! ```text
//! origin fetch result
//!     → transport failure?        → Failure(Transport)
//!     → non-success status?       → Failure(OriginError, origin body)
//!     → decode (codec)            → Failure(DecodeError) on error
//!     → transform                 → Success(image, original format)
//! ```
//!
//! Steps run strictly in that order. The pipeline never encodes; that is
//! the handler's job once it knows the deadline has not won.

pub mod conversion;
pub mod outcome;

pub use conversion::ConversionPipeline;
pub use outcome::{ConversionOutcome, Failure};
