//! Pipeline stages for image↔PDF conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. Nothing here is async: the orchestrator in [`crate::convert`] moves
//! every unit of work onto `spawn_blocking`.
//!
//! ## Data Flow
//!
//! ```text
//! image bytes ──▶ decode ──▶ units ──▶ assemble ──▶ PDF bytes
//!                 (image)   (px→mm)   (printpdf)
//!
//! PDF bytes ──▶ engine ──▶ render ──▶ guard ──▶ encode ──▶ page images
//!              (pdfium)   (pts→px)   (limit)   (png/jpeg/webp)
//! ```
//!
//! 1. [`units`]   : pixel/millimetre conversion and page geometry
//! 2. [`guard`]   : canvas-size ceiling, checked before any bitmap exists
//! 3. [`engine`]  : the injected PDF parsing/rasterisation capability
//! 4. [`render`]  : one page at a target DPI
//! 5. [`encode`] / [`decode`]: raster codecs
//! 6. [`assemble`]: one or many images into a PDF
//! 7. [`batch`]   : every page of one PDF

pub mod assemble;
pub mod batch;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod guard;
pub mod render;
pub mod units;
