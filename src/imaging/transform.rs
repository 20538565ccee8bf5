//! Pixel transforms.
//!
//! A transform is any pure function from pixels to pixels with the same
//! dimensions. Closures implement [`Transform`] directly.

use image::{DynamicImage, Rgba};

pub trait Transform: Send + Sync {
    fn apply(&self, image: &DynamicImage) -> DynamicImage;
}

impl<F> Transform for F
where
    F: Fn(&DynamicImage) -> DynamicImage + Send + Sync,
{
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        self(image)
    }
}

/// Luminance-preserving grayscale into an RGBA buffer.
///
/// Uses the ITU-R BT.601 weights at 16-bit precision. Alpha is carried over
/// from the source pixel unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl Transform for Grayscale {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let mut out = image.to_rgba8();
        for Rgba([r, g, b, _]) in out.pixels_mut() {
            let y = luminance(*r, *g, *b);
            (*r, *g, *b) = (y, y, y);
        }
        DynamicImage::ImageRgba8(out)
    }
}

fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let widen = |c: u8| u32::from(c) * 0x101;
    // Weights sum to 65536, so gray input maps to itself.
    let y = (19595 * widen(r) + 38470 * widen(g) + 7471 * widen(b) + (1 << 15)) >> 16;
    (y >> 8) as u8
}
