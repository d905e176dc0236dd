//! The PDF rasterisation capability.
//!
//! The pipeline never talks to pdfium directly. It goes through
//! [`RasterEngine`], which a [`crate::convert::Converter`] receives at
//! construction. That keeps engine setup explicit (no process-wide worker or
//! library configuration) and lets tests drive the whole pipeline with a fake
//! engine.
//!
//! ## Why two traits?
//!
//! pdfium documents borrow the library handle, so an open document cannot
//! outlive the engine that opened it. [`RasterEngine::open`] returns a boxed
//! [`SourceDocument`] tied to `&self`, which expresses exactly that.

use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming a directory that contains libpdfium.
pub const PDFIUM_LIB_ENV: &str = "PIXPDF_PDFIUM_LIB";

/// Failure reported by an engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The document could not be opened.
    #[error("{0}")]
    Open(String),

    /// The document is encrypted and the password is missing or wrong.
    #[error("document is encrypted: {0}")]
    Password(String),

    /// A page could not be loaded or drawn.
    #[error("{0}")]
    Page(String),
}

/// Something that can parse PDF bytes into a renderable document.
pub trait RasterEngine: Send + Sync {
    /// Parse `bytes` into a document.
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, EngineError>;
}

/// A parsed PDF.
///
/// Page indices are 0-based here; the rest of the crate reports 1-based
/// page numbers.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Page size at scale 1, in PDF points (72 per inch).
    fn page_size_pts(&self, index: usize) -> Result<(f32, f32), EngineError>;

    /// Render a page into a bitmap of exactly `width_px × height_px`, using
    /// print-quality settings.
    fn render(&self, index: usize, width_px: u32, height_px: u32)
        -> Result<DynamicImage, EngineError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`RasterEngine`] backed by the pdfium C++ library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to pdfium, looking in `lib_dir` if given, otherwise next to the
    /// executable's working directory and then in the system library path.
    pub fn bind(lib_dir: Option<&Path>) -> Result<Self, ConvertError> {
        let bindings = match lib_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::EngineUnavailable(format!("{:?}", e)))?;

        info!("Bound pdfium library");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind using the directory in `PIXPDF_PDFIUM_LIB`, if set.
    pub fn from_env() -> Result<Self, ConvertError> {
        match std::env::var(PDFIUM_LIB_ENV) {
            Ok(dir) if !dir.is_empty() => Self::bind(Some(Path::new(&dir))),
            _ => Self::bind(None),
        }
    }
}

impl RasterEngine for PdfiumEngine {
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    EngineError::Password(if password.is_some() {
                        "wrong password".into()
                    } else {
                        "password required".into()
                    })
                } else {
                    EngineError::Open(err_str)
                }
            })?;

        debug!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, EngineError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| EngineError::Page(format!("{:?}", e)))
    }
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size_pts(&self, index: usize) -> Result<(f32, f32), EngineError> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render(
        &self,
        index: usize,
        width_px: u32,
        height_px: u32,
    ) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;

        // Print quality keeps thin strokes (signatures, hairlines) that the
        // screen path may drop.
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .use_print_quality(true)
            .render_form_data(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| EngineError::Page(format!("{:?}", e)))?;

        Ok(bitmap.as_image())
    }
}
