//! Page rasterisation: one PDF page → one encoded bitmap at a target DPI.
//!
//! ## Order of operations
//!
//! 1. Read the page size at scale 1 (PDF points, 72 per inch).
//! 2. Scale by `dpi / 72` and round up to whole pixels.
//! 3. Check the result against the canvas limit. Nothing is allocated for a
//!    page that fails here.
//! 4. Render at print quality into a bitmap of that exact size.
//! 5. Encode (PNG unless configured otherwise).

use crate::config::RasterFormat;
use crate::error::PageError;
use crate::output::RasterPage;
use crate::pipeline::encode::encode_raster;
use crate::pipeline::engine::SourceDocument;
use crate::pipeline::guard;
use crate::pipeline::units::{RasterDimensions, POINTS_PER_INCH};
use tracing::debug;

/// Per-call rendering parameters.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub dpi: u32,
    pub canvas_limit: u32,
    pub format: RasterFormat,
}

/// Pixel size of a page of `width_pts × height_pts` rendered at `dpi`.
///
/// Returned as `u64` so the caller can guard it before narrowing.
pub fn scaled_size(width_pts: f32, height_pts: f32, dpi: u32) -> (u64, u64) {
    let px = |pts: f32| {
        (f64::from(pts) * f64::from(dpi) / POINTS_PER_INCH)
            .ceil()
            .max(1.0) as u64
    };
    (px(width_pts), px(height_pts))
}

/// Output file name for page `page_num` of a document with stem `stem`.
pub fn page_filename(stem: &str, page_num: usize, format: RasterFormat) -> String {
    format!("{}_page_{}.{}", stem, page_num, format.extension())
}

/// Rasterise the page at 0-based `index`.
pub fn render_page(
    document: &dyn SourceDocument,
    index: usize,
    stem: &str,
    settings: RenderSettings,
) -> Result<RasterPage, PageError> {
    let page_num = index + 1;

    let (width_pts, height_pts) =
        document
            .page_size_pts(index)
            .map_err(|e| PageError::RenderFailed {
                page: page_num,
                detail: e.to_string(),
            })?;

    let (width_px, height_px) = scaled_size(width_pts, height_pts, settings.dpi);
    guard::check(page_num, width_px, height_px, settings.canvas_limit)?;

    // Both sides are ≤ canvas_limit (a u32) past the guard.
    let dims = RasterDimensions::new(width_px as u32, height_px as u32);

    let image = document
        .render(index, dims.width_px, dims.height_px)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

    debug!(
        "Rendered page {} ({:.1}x{:.1} pt) → {}x{} px @ {} DPI",
        page_num,
        width_pts,
        height_pts,
        image.width(),
        image.height(),
        settings.dpi
    );

    let bytes = encode_raster(&image, settings.format).map_err(|e| PageError::EncodeFailed {
        page: page_num,
        detail: e.to_string(),
    })?;

    Ok(RasterPage {
        page_num,
        width_px: image.width(),
        height_px: image.height(),
        filename: page_filename(stem, page_num, settings.format),
        bytes,
    })
}
