//! Container codec adapter.
//!
//! Decoding sniffs the format from the bytes themselves; the origin's
//! `Content-Type` is never consulted. Encoding writes back into the format
//! tag carried by the decoded image.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// Formats supported for both decode and encode.
pub const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// Pixel data plus the container format it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub pixels: DynamicImage,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unrecognized image format: {0}")]
    Unrecognized(String),
    #[error("unsupported image format: {0:?}")]
    Unsupported(ImageFormat),
    #[error("failed to decode {format:?} image: {source}")]
    Decode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode {format:?} image: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
}

/// Bytes to pixels and back.
pub trait Codec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    fn encode(&self, pixels: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CodecError>;
}

/// Check whether `format` is in [`SUPPORTED_FORMATS`].
pub fn is_supported(format: ImageFormat) -> bool {
    SUPPORTED_FORMATS.contains(&format)
}

/// `Content-Type` for encoded bytes of `format`, e.g. `image/png`.
pub fn content_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}

/// Codec backed by the `image` crate's raster formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl Codec for RasterCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let format =
            image::guess_format(bytes).map_err(|e| CodecError::Unrecognized(e.to_string()))?;
        if !is_supported(format) {
            return Err(CodecError::Unsupported(format));
        }

        let pixels = image::load_from_memory_with_format(bytes, format)
            .map_err(|source| CodecError::Decode { format, source })?;

        Ok(DecodedImage { pixels, format })
    }

    fn encode(&self, pixels: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
        if !is_supported(format) {
            return Err(CodecError::Unsupported(format));
        }

        let mut buf = Cursor::new(Vec::new());
        let result = match format {
            // JPEG has no alpha channel.
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(pixels.to_rgb8()).write_to(&mut buf, format),
            _ => pixels.write_to(&mut buf, format),
        };
        result.map_err(|source| CodecError::Encode { format, source })?;

        Ok(buf.into_inner())
    }
}
