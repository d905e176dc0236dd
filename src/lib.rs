//! # pixpdf
//!
//! Convert images to PDFs whose pages are exactly the size of the image, and
//! PDF pages to high-resolution images.
//!
//! ## Why this crate?
//!
//! Most image→PDF tools put every image on an A4 or Letter page with
//! margins, and most PDF→image tools render at screen resolution. This crate
//! does neither: a page is derived from the image's pixels at 96 px per inch,
//! and PDF pages are rendered at print resolution (600 DPI by default) so
//! signatures and hairlines survive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Classify  by declared media type (image/* or application/pdf)
//!  ├─ 2. Pre-scan  count pages so progress has a real total
//!  ├─ 3. Convert   one file at a time, on spawn_blocking
//!  │     ├─ image → decode → px→mm → one-page PDF   (printpdf)
//!  │     └─ PDF   → per page: pts→px → guard → render → encode (pdfium)
//!  └─ 4. Output    results in input order + per-file warnings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixpdf::{ConversionConfig, Converter, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().dpi(300).build()?;
//!     let converter = Converter::with_pdfium(config)?;
//!
//!     let files = vec![
//!         SourceFile::from_path("scan.png")?,
//!         SourceFile::from_path("report.pdf")?,
//!     ];
//!     let output = converter.convert_to_dir(files, "out").await?;
//!     for w in &output.warnings {
//!         eprintln!("warning: {}", w);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pixpdf` binary (clap + anyhow + indicatif + tracing-subscriber + serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pixpdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! PDF rasterisation needs the pdfium shared library at runtime. It is looked
//! up in the directory named by `PIXPDF_PDFIUM_LIB`, then the working
//! directory, then the system library path. Image→PDF conversion does not
//! need it; pass your own [`RasterEngine`] to [`Converter::new`] to avoid
//! binding pdfium at all.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, RasterFormat};
pub use convert::{write_results, Converter};
pub use error::{ConvertError, ImagePageError, PageError, Warning};
pub use input::{MediaKind, SourceFile};
pub use output::{
    BatchOutput, ConversionResult, DocumentInfo, OutputDocument, RasterPage, ResultKind,
};
pub use pipeline::decode::DecodeError;
pub use pipeline::engine::{EngineError, PdfiumEngine, RasterEngine, SourceDocument};
pub use pipeline::units::{mm_to_px, px_to_mm, Orientation, PageGeometry, RasterDimensions};
pub use progress::{
    ConversionProgressCallback, NoopProgressCallback, ProgressCallback, ProgressState,
};
