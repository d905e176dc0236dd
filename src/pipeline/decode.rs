//! Image decoding: bytes → `{width, height, pixels}`.
//!
//! Pixels come back as opaque RGB. Transparent areas are composited onto
//! white, which is what a printed page shows behind them.

use crate::pipeline::units::RasterDimensions;
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Why image bytes could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Unknown format, corrupt data or an unsupported encoding.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The header declares a zero-sized image.
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// A decoded input image.
pub struct DecodedImage {
    pub dimensions: RasterDimensions,
    pub pixels: RgbImage,
}

/// Read the pixel size from the image header without decoding the pixels.
pub fn dimensions(bytes: &[u8]) -> Result<RasterDimensions, DecodeError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty { width, height });
    }
    Ok(RasterDimensions::new(width, height))
}

/// Decode any supported image format.
///
/// Zero-sized images are rejected: they cannot become a page.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::Empty {
            width: img.width(),
            height: img.height(),
        });
    }
    let dimensions = RasterDimensions::new(img.width(), img.height());
    Ok(DecodedImage {
        dimensions,
        pixels: flatten_onto_white(img),
    })
}

fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let p = rgba.get_pixel(x, y).0;
        let a = u16::from(p[3]);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}
