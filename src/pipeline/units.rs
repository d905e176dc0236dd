//! Pixel ↔ millimetre conversion and page geometry.
//!
//! One pixel is defined as 1/96 inch (the CSS reference pixel), so
//! `1 px = 25.4 / 96 mm ≈ 0.2645833 mm`. Every page size this crate writes is
//! derived from this single constant; a PDF made from a 1000 × 500 px image
//! is 264.58 × 132.29 mm regardless of the image's embedded DPI metadata.

use serde::{Deserialize, Serialize};

/// Reference pixel density of image→PDF output.
pub const REFERENCE_DPI: f64 = 96.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Millimetres per reference pixel.
pub const PX_TO_MM: f64 = MM_PER_INCH / REFERENCE_DPI;

/// PDF user-space units (points) per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert pixels to millimetres.
pub fn px_to_mm(px: f64) -> f64 {
    px * PX_TO_MM
}

/// Convert millimetres to pixels.
pub fn mm_to_px(mm: f64) -> f64 {
    mm / PX_TO_MM
}

/// Pixel size of an image or rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterDimensions {
    pub width_px: u32,
    pub height_px: u32,
}

impl RasterDimensions {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// The longer of the two sides.
    pub fn max_side(&self) -> u32 {
        self.width_px.max(self.height_px)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape only when strictly wider than tall; squares are portrait.
    pub fn of(width_px: u32, height_px: u32) -> Self {
        if width_px > height_px {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Physical page size derived from pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub orientation: Orientation,
}

impl PageGeometry {
    pub fn from_dimensions(dims: RasterDimensions) -> Self {
        Self {
            width_mm: px_to_mm(f64::from(dims.width_px)),
            height_mm: px_to_mm(f64::from(dims.height_px)),
            orientation: Orientation::of(dims.width_px, dims.height_px),
        }
    }
}
