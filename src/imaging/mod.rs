//! Image capabilities injected into the conversion pipeline.
//!
//! # Data Flow
//! ```text
//! origin bytes
//!     → codec.rs (sniff container, decode to pixels + format tag)
//!     → transform.rs (pixels → pixels, same dimensions)
//!     → codec.rs (encode back into the original format)
//! ```
//!
//! Both capabilities are traits; nothing here performs I/O or blocks.

pub mod codec;
pub mod transform;

pub use codec::{content_type, Codec, CodecError, DecodedImage, RasterCodec, SUPPORTED_FORMATS};
pub use transform::{Grayscale, Transform};
