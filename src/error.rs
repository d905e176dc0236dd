//! Error types for the pixpdf library.
//!
//! Three types reflect three levels of failure:
//!
//! * [`ConvertError`]: **Fatal**: the batch cannot proceed at all (no
//!   input, a media type we cannot classify, an unusable configuration, no
//!   rendering engine). Also returned by the single-file entry points when
//!   that one file fails.
//!
//! * [`PageError`]: a single page of a PDF could not be rasterised. Inside
//!   [`crate::pipeline::batch`] any page error fails the whole document, so a
//!   partial page set is never mistaken for a complete conversion.
//!
//! * [`Warning`]: **Non-fatal**: one input file was skipped or failed while
//!   the rest of the batch carried on. Collected into
//!   [`crate::output::BatchOutput::warnings`].

use crate::pipeline::decode::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pixpdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch contained no files.
    #[error("No input files provided")]
    NoInput,

    /// A file's declared media type is neither `image/*` nor `application/pdf`.
    #[error("Unsupported file type '{media_type}' for '{name}'")]
    UnsupportedType { name: String, media_type: String },

    /// Could not read an input file from disk.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Per-file failures surfaced by single-file entry points ───────────
    /// The image is corrupt or in a format we cannot decode.
    #[error("Failed to decode image '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    /// The PDF is corrupt, encrypted or otherwise unreadable.
    #[error("Failed to parse PDF '{name}': {detail}")]
    Parse { name: String, detail: String },

    /// A page could not be produced: a PDF page failed to rasterise, or an
    /// image is larger than the raster limit.
    #[error("Failed to convert '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: PageError,
    },

    /// Multi-image assembly stopped at the image with this 0-based index.
    #[error("Assembly failed at image {} ('{name}'): {source}", .index + 1)]
    Assembly {
        index: usize,
        name: String,
        #[source]
        source: ImagePageError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the executable, install it system-wide,\n\
or point PIXPDF_PDFIUM_LIB at the directory that contains it.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    EngineUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure while rasterising one page of a PDF.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page at the requested DPI would exceed the raster ceiling.
    #[error(
        "Page {page} dimensions ({requested_px}px) exceed the raster limit of {limit}px. \
Reduce DPI or split the PDF."
    )]
    DimensionExceeded {
        page: usize,
        requested_px: u64,
        limit: u32,
    },

    /// The engine failed to load or draw the page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be encoded.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-based page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::DimensionExceeded { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

/// Why one image could not become a PDF page.
#[derive(Debug, Error)]
pub enum ImagePageError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    TooLarge(#[from] PageError),
}

/// A non-fatal, per-file outcome recorded while the batch continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// A PDF larger than the configured size limit was skipped unparsed.
    #[error("'{name}' ({size} bytes) exceeds the {limit}-byte limit and was skipped")]
    SizeLimitSkipped { name: String, size: u64, limit: u64 },

    /// The file failed to convert; other files were still processed.
    #[error("'{name}': {reason}")]
    Failed { name: String, reason: String },
}

impl Warning {
    /// Name of the input file the warning refers to.
    pub fn file_name(&self) -> &str {
        match self {
            Warning::SizeLimitSkipped { name, .. } | Warning::Failed { name, .. } => name,
        }
    }

    pub(crate) fn from_error(name: &str, err: &ConvertError) -> Self {
        let reason = match err {
            ConvertError::Render { source, .. } => source.to_string(),
            ConvertError::Decode { source, .. } => source.to_string(),
            ConvertError::Parse { detail, .. } => detail.clone(),
            other => other.to_string(),
        };
        Warning::Failed {
            name: name.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_exceeded_display_names_page_and_limit() {
        let e = PageError::DimensionExceeded {
            page: 2,
            requested_px: 40000,
            limit: 32767,
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 2"), "got: {msg}");
        assert!(msg.contains("40000px"), "got: {msg}");
        assert!(msg.contains("32767px"), "got: {msg}");
        assert!(msg.contains("Reduce DPI"), "got: {msg}");
    }

    #[test]
    fn page_accessor() {
        let e = PageError::RenderFailed {
            page: 7,
            detail: "boom".into(),
        };
        assert_eq!(e.page(), 7);
    }

    #[test]
    fn assembly_display_is_one_based() {
        let e = ConvertError::Assembly {
            index: 0,
            name: "a.png".into(),
            source: ImagePageError::Decode(DecodeError::Empty {
                width: 0,
                height: 5,
            }),
        };
        assert!(e.to_string().contains("image 1"), "got: {e}");
        assert!(e.to_string().contains("a.png"));
        assert!(e.to_string().contains("0x5"), "got: {e}");
    }

    #[test]
    fn assembly_keeps_dimension_error_reachable() {
        let e = ConvertError::Assembly {
            index: 2,
            name: "huge.png".into(),
            source: PageError::DimensionExceeded {
                page: 3,
                requested_px: 40000,
                limit: 32767,
            }
            .into(),
        };
        let source = std::error::Error::source(&e).expect("assembly error has a source");
        assert!(source.to_string().contains("40000px"), "got: {source}");
        assert!(matches!(
            e,
            ConvertError::Assembly {
                source: ImagePageError::TooLarge(PageError::DimensionExceeded { .. }),
                ..
            }
        ));
    }

    #[test]
    fn warning_from_render_error_keeps_page_detail() {
        let err = ConvertError::Render {
            name: "big.pdf".into(),
            source: PageError::DimensionExceeded {
                page: 3,
                requested_px: 33000,
                limit: 32767,
            },
        };
        let w = Warning::from_error("big.pdf", &err);
        assert_eq!(w.file_name(), "big.pdf");
        assert!(w.to_string().contains("Page 3"), "got: {w}");
    }

    #[test]
    fn size_limit_warning_display() {
        let w = Warning::SizeLimitSkipped {
            name: "huge.pdf".into(),
            size: 60,
            limit: 50,
        };
        assert!(w.to_string().contains("huge.pdf"));
        assert!(w.to_string().contains("skipped"));
    }
}
