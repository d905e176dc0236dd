//! Configuration types for image/PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The rendering engine is *not* part of
//! the config: it is injected into [`crate::convert::Converter`] at
//! construction so tests can substitute it.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default rendering DPI for PDF→image conversion.
pub const DEFAULT_DPI: u32 = 600;

/// Lowest DPI accepted by the builder (one pixel per PDF point).
pub const MIN_DPI: u32 = 72;

/// Highest DPI accepted by the builder.
pub const MAX_DPI: u32 = 2400;

/// Largest raster dimension, per axis, that a rendering surface may allocate.
pub const DEFAULT_CANVAS_LIMIT: u32 = 32_767;

/// PDFs larger than this are skipped by the batch converter.
pub const DEFAULT_SIZE_LIMIT: u64 = 50 * 1024 * 1024;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pixpdf::{ConversionConfig, RasterFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .raster_format(RasterFormat::Png)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Default: 600.
    ///
    /// PDF user space is 72 units per inch, so pages are scaled by `dpi / 72`.
    /// 600 keeps fine content such as signatures legible while a US-letter
    /// page stays well under the canvas limit; 1200 is valid for small pages
    /// but trips the limit on letter-sized ones.
    pub dpi: u32,

    /// Maximum rendered dimension (width or height) in pixels. Default: 32767.
    ///
    /// Unlike a cap that silently downsamples, exceeding this fails the page
    /// with [`crate::error::PageError::DimensionExceeded`] before anything is
    /// allocated.
    pub canvas_limit: u32,

    /// PDFs whose byte size exceeds this are skipped with a warning. Default: 50 MiB.
    pub size_limit: u64,

    /// Encoding of rasterised PDF pages. Default: [`RasterFormat::Png`].
    pub raster_format: RasterFormat,

    /// Optional password for encrypted PDFs.
    pub password: Option<String>,

    /// Progress events for the run. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            canvas_limit: DEFAULT_CANVAS_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            raster_format: RasterFormat::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("canvas_limit", &self.canvas_limit)
            .field("size_limit", &self.size_limit)
            .field("raster_format", &self.raster_format)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn canvas_limit(mut self, px: u32) -> Self {
        self.config.canvas_limit = px;
        self
    }

    pub fn size_limit(mut self, bytes: u64) -> Self {
        self.config.size_limit = bytes;
        self
    }

    pub fn raster_format(mut self, format: RasterFormat) -> Self {
        self.config.raster_format = format;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(MIN_DPI..=MAX_DPI).contains(&c.dpi) {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.canvas_limit == 0 || c.canvas_limit > DEFAULT_CANVAS_LIMIT {
            return Err(ConvertError::InvalidConfig(format!(
                "Canvas limit must be 1–{DEFAULT_CANVAS_LIMIT} px, got {}",
                c.canvas_limit
            )));
        }
        if c.size_limit == 0 {
            return Err(ConvertError::InvalidConfig(
                "Size limit must be at least 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output encoding for rasterised PDF pages.
///
/// PNG is the default because it is lossless. JPEG is encoded at quality 95;
/// WebP uses the lossless encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl RasterFormat {
    /// File extension used in output names.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Webp => "webp",
        }
    }

    /// Media type of the encoded payload.
    pub fn media_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Webp => "image/webp",
        }
    }
}

impl std::str::FromStr for RasterFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(RasterFormat::Png),
            "jpg" | "jpeg" => Ok(RasterFormat::Jpeg),
            "webp" => Ok(RasterFormat::Webp),
            other => Err(ConvertError::InvalidConfig(format!(
                "Unknown raster format '{other}' (expected png, jpeg or webp)"
            ))),
        }
    }
}
