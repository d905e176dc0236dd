//! Raster encoding: `DynamicImage` → file bytes.
//!
//! PNG is the default and is lossless. JPEG, when asked for, is written at
//! quality 95 from an RGB copy; WebP uses the lossless encoder.

use crate::config::RasterFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Quality factor for JPEG output.
pub const JPEG_QUALITY: u8 = 95;

/// Encode a rendered page in the requested format.
pub fn encode_raster(img: &DynamicImage, format: RasterFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
        RasterFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
        }
        RasterFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
    }
    debug!(
        "Encoded {}x{} image → {} bytes {:?}",
        img.width(),
        img.height(),
        buf.len(),
        format
    );
    Ok(buf)
}
