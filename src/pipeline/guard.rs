//! Raster-size ceiling check, run before any bitmap is allocated.
//!
//! Rendering surfaces have a hard per-axis limit. Past it, backends either
//! abort or silently truncate the bitmap, so the request is rejected up front
//! with a [`PageError::DimensionExceeded`] that carries enough detail for the
//! caller to suggest lowering the DPI or splitting the document.

use crate::error::PageError;

/// Check a requested raster size against `limit`.
///
/// `page` is the 1-based page (or image) number reported on failure.
/// Widths and heights are `u64` so that an absurd DPI on a large page
/// cannot wrap around before the comparison.
pub fn check(page: usize, width_px: u64, height_px: u64, limit: u32) -> Result<(), PageError> {
    let requested = width_px.max(height_px);
    if requested > u64::from(limit) {
        return Err(PageError::DimensionExceeded {
            page,
            requested_px: requested,
            limit,
        });
    }
    Ok(())
}
