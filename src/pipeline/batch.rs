//! Whole-document rasterisation: every page of one PDF, in order.
//!
//! A page failure fails the document. Returning pages 1–2 of a 3-page PDF
//! would look like a complete conversion, so no partial set is ever returned.
//! The orchestrator turns that failure into a per-file warning.

use crate::error::ConvertError;
use crate::input::SourceFile;
use crate::output::RasterPage;
use crate::pipeline::engine::{EngineError, RasterEngine};
use crate::pipeline::render::{render_page, RenderSettings};
use tracing::{debug, info};

/// Parse a PDF just far enough to count its pages.
pub fn count_pages(
    engine: &dyn RasterEngine,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<usize, EngineError> {
    let document = engine.open(bytes, password)?;
    Ok(document.page_count())
}

/// Rasterise pages 1..=N of `file`.
///
/// `on_page` runs after each page is encoded, in page order.
/// This is blocking: call it from `spawn_blocking`.
pub fn convert_document(
    engine: &dyn RasterEngine,
    file: &SourceFile,
    password: Option<&str>,
    settings: RenderSettings,
    on_page: &mut dyn FnMut(&RasterPage),
) -> Result<Vec<RasterPage>, ConvertError> {
    let document = engine
        .open(&file.bytes, password)
        .map_err(|e| ConvertError::Parse {
            name: file.name.clone(),
            detail: e.to_string(),
        })?;

    let total = document.page_count();
    if total == 0 {
        return Err(ConvertError::Parse {
            name: file.name.clone(),
            detail: "document has no pages".into(),
        });
    }
    info!(
        "Rasterising '{}': {} pages @ {} DPI",
        file.name, total, settings.dpi
    );

    let stem = file.stem();
    let mut pages = Vec::with_capacity(total);
    for index in 0..total {
        let page = render_page(document.as_ref(), index, stem, settings).map_err(|source| {
            ConvertError::Render {
                name: file.name.clone(),
                source,
            }
        })?;
        on_page(&page);
        pages.push(page);
    }

    debug!("'{}' → {} images", file.name, pages.len());
    Ok(pages)
}
