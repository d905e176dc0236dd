//! Conversion outputs: per-file results, raster pages and assembled PDFs.
//!
//! Every payload is an owned `Vec<u8>`. A result lives until the caller drops
//! it; [`BatchOutput::release`] exists so a caller can release the previous
//! batch explicitly before starting the next one.

use crate::error::Warning;
use crate::pipeline::units::PageGeometry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESULT_ID: AtomicU64 = AtomicU64::new(1);

/// Next session-unique result id.
pub(crate) fn next_result_id() -> u64 {
    NEXT_RESULT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Whether a result is a PDF or a raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Document,
    Raster,
}

/// One downloadable output of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Unique within the process.
    pub id: u64,
    /// Suggested file name, e.g. `photo.pdf` or `report_page_3.png`.
    pub filename: String,
    pub kind: ResultKind,
    /// Encoded bytes. Skipped in JSON reports.
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl ConversionResult {
    pub(crate) fn new(filename: String, kind: ResultKind, payload: Vec<u8>) -> Self {
        Self {
            id: next_result_id(),
            filename,
            kind,
            payload,
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<OutputDocument> for ConversionResult {
    fn from(doc: OutputDocument) -> Self {
        ConversionResult::new(doc.filename, ResultKind::Document, doc.bytes)
    }
}

impl From<RasterPage> for ConversionResult {
    fn from(page: RasterPage) -> Self {
        ConversionResult::new(page.filename, ResultKind::Raster, page.bytes)
    }
}

/// A rendered PDF page, already encoded.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number within the source PDF.
    pub page_num: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An encoded PDF and the geometry of each page in it.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub filename: String,
    pub pages: Vec<PageGeometry>,
    pub bytes: Vec<u8>,
}

impl OutputDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Everything a batch produced: results in input order plus warnings.
///
/// An empty `results` with non-empty `warnings` is a valid outcome.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BatchOutput {
    pub results: Vec<ConversionResult>,
    pub warnings: Vec<Warning>,
}

impl BatchOutput {
    /// Drop every payload held by this batch.
    pub fn release(self) {
        tracing::debug!(
            "Releasing {} results ({} bytes)",
            self.results.len(),
            self.results.iter().map(|r| r.len()).sum::<usize>()
        );
    }

    /// Warning messages formatted for display.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Page count and first-page size of a PDF, without rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size_bytes: u64,
    pub page_count: usize,
    /// First page size in PDF points, if the document has pages.
    pub first_page_pts: Option<(f32, f32)>,
}
