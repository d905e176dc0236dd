//! Conversion entry points.
//!
//! [`Converter::convert_batch`] is the orchestrator: it classifies every
//! input, pre-counts the work, converts files one after another and collects
//! results and warnings. The single-purpose methods (`image_to_pdf`,
//! `images_to_pdf`, `pdf_to_images`, `inspect`) expose the pipeline stages
//! directly and return their errors instead of turning them into warnings.
//!
//! All decoding, rendering and PDF writing runs inside
//! `tokio::task::spawn_blocking` because pdfium is not async-safe. An opened
//! document borrows the engine, so each PDF is converted start to finish in a
//! single blocking task.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Warning};
use crate::input::{file_stem, MediaKind, SourceFile};
use crate::output::{BatchOutput, ConversionResult, DocumentInfo, OutputDocument, RasterPage};
use crate::pipeline::assemble::{self, assembled_filename};
use crate::pipeline::batch;
use crate::pipeline::engine::{PdfiumEngine, RasterEngine};
use crate::pipeline::render::RenderSettings;
use crate::progress::ProgressTracker;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs conversions with one engine and one configuration.
///
/// Cheap to share: wrap it in an `Arc` or clone the engine handle into a new
/// `Converter` with a different config.
pub struct Converter {
    engine: Arc<dyn RasterEngine>,
    config: ConversionConfig,
}

impl Converter {
    /// Create a converter around an already-constructed engine.
    pub fn new(engine: Arc<dyn RasterEngine>, config: ConversionConfig) -> Self {
        Self { engine, config }
    }

    /// Create a converter backed by pdfium, located via `PIXPDF_PDFIUM_LIB`,
    /// the working directory, or the system library path.
    pub fn with_pdfium(config: ConversionConfig) -> Result<Self, ConvertError> {
        let engine = PdfiumEngine::from_env()?;
        Ok(Self::new(Arc::new(engine), config))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            dpi: self.config.dpi,
            canvas_limit: self.config.canvas_limit,
            format: self.config.raster_format,
        }
    }

    /// Convert a mixed batch: every image becomes a one-page PDF, every PDF
    /// becomes one image per page.
    ///
    /// # Errors
    /// Fatal errors only:
    /// - [`ConvertError::NoInput`] for an empty batch
    /// - [`ConvertError::UnsupportedType`] if any file is neither `image/*`
    ///   nor `application/pdf` (checked before anything is converted)
    ///
    /// Everything else (undecodable images, unparseable PDFs, pages over the
    /// canvas limit, PDFs over the size limit) becomes a [`Warning`] and the
    /// remaining files are still converted.
    pub async fn convert_batch(&self, files: Vec<SourceFile>) -> Result<BatchOutput, ConvertError> {
        let start = Instant::now();
        if files.is_empty() {
            return Err(ConvertError::NoInput);
        }

        // ── Step 1: Classify ─────────────────────────────────────────────
        let kinds = files
            .iter()
            .map(SourceFile::kind)
            .collect::<Result<Vec<_>, _>>()?;
        let files: Vec<Arc<SourceFile>> = files.into_iter().map(Arc::new).collect();
        info!("Starting batch: {} files", files.len());

        // ── Step 2: Pre-scan ─────────────────────────────────────────────
        let total_units = self.prescan(&files, &kinds).await?;
        debug!("Pre-scan: {} units", total_units);

        let mut tracker = ProgressTracker::new(self.config.progress_callback.clone(), total_units);
        let mut output = BatchOutput::default();

        // ── Step 3: Convert, one file at a time ──────────────────────────
        for (file, kind) in files.into_iter().zip(kinds) {
            match kind {
                MediaKind::Image => {
                    let canvas_limit = self.config.canvas_limit;
                    let job = Arc::clone(&file);
                    let result = tokio::task::spawn_blocking(move || {
                        assemble::image_to_pdf(&job.name, &job.bytes, canvas_limit)
                    })
                    .await
                    .map_err(join_error)?;
                    tracker.advance();

                    match result {
                        Ok(doc) => output.results.push(doc.into()),
                        Err(e) => {
                            let warning = Warning::from_error(&file.name, &e);
                            record_warning(&mut output, &tracker, warning);
                        }
                    }
                }
                MediaKind::Pdf => {
                    if file.size() > self.config.size_limit {
                        let warning = Warning::SizeLimitSkipped {
                            name: file.name.clone(),
                            size: file.size(),
                            limit: self.config.size_limit,
                        };
                        record_warning(&mut output, &tracker, warning);
                        continue;
                    }

                    let (returned, result) = self.rasterise(Arc::clone(&file), tracker).await?;
                    tracker = returned;

                    match result {
                        Ok(pages) => output
                            .results
                            .extend(pages.into_iter().map(ConversionResult::from)),
                        Err(e) => {
                            let warning = Warning::from_error(&file.name, &e);
                            record_warning(&mut output, &tracker, warning);
                        }
                    }
                }
            }
        }

        info!(
            "Batch complete: {} results, {} warnings in {}ms",
            output.results.len(),
            output.warnings.len(),
            start.elapsed().as_millis()
        );
        tracker.finish(output.results.len(), output.warnings.len());
        Ok(output)
    }

    /// Synchronous wrapper around [`Converter::convert_batch`].
    ///
    /// Creates a temporary tokio runtime internally; do not call it from
    /// inside an async context.
    pub fn convert_batch_sync(&self, files: Vec<SourceFile>) -> Result<BatchOutput, ConvertError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert_batch(files))
    }

    /// Convert a batch and write every result into `dir`.
    pub async fn convert_to_dir(
        &self,
        files: Vec<SourceFile>,
        dir: impl AsRef<Path>,
    ) -> Result<BatchOutput, ConvertError> {
        let output = self.convert_batch(files).await?;
        write_results(&output.results, dir).await?;
        Ok(output)
    }

    /// Convert one image into a one-page PDF.
    pub async fn image_to_pdf(&self, file: SourceFile) -> Result<OutputDocument, ConvertError> {
        expect_kind(&file, MediaKind::Image)?;
        let canvas_limit = self.config.canvas_limit;
        tokio::task::spawn_blocking(move || {
            assemble::image_to_pdf(&file.name, &file.bytes, canvas_limit)
        })
        .await
        .map_err(join_error)?
    }

    /// Assemble several images into one PDF named `converted_images_{date}.pdf`.
    ///
    /// Progress reports one unit per placed image. The first image that fails
    /// aborts the assembly.
    pub async fn images_to_pdf(&self, files: Vec<SourceFile>) -> Result<OutputDocument, ConvertError> {
        for file in &files {
            expect_kind(file, MediaKind::Image)?;
        }
        if files.is_empty() {
            return Err(ConvertError::NoInput);
        }

        let canvas_limit = self.config.canvas_limit;
        let mut tracker = ProgressTracker::new(self.config.progress_callback.clone(), files.len());
        let (tracker, result) = tokio::task::spawn_blocking(move || {
            let result = assemble::assemble(
                &files,
                canvas_limit,
                assembled_filename(),
                &mut |_, _| tracker.advance(),
            );
            (tracker, result)
        })
        .await
        .map_err(join_error)?;

        match result {
            Ok(doc) => {
                info!("Assembled {} pages into {}", doc.page_count(), doc.filename);
                tracker.finish(1, 0);
                Ok(doc)
            }
            Err(e) => {
                warn!("Assembly failed: {}", e);
                tracker.finish(0, 0);
                Err(e)
            }
        }
    }

    /// Rasterise every page of one PDF.
    ///
    /// The size limit is not applied here; it is a batch policy.
    pub async fn pdf_to_images(&self, file: SourceFile) -> Result<Vec<RasterPage>, ConvertError> {
        expect_kind(&file, MediaKind::Pdf)?;
        let file = Arc::new(file);
        let engine = Arc::clone(&self.engine);
        let password = self.config.password.clone();
        let job = Arc::clone(&file);
        let total = tokio::task::spawn_blocking(move || {
            batch::count_pages(engine.as_ref(), &job.bytes, password.as_deref()).unwrap_or(0)
        })
        .await
        .map_err(join_error)?;

        let tracker = ProgressTracker::new(self.config.progress_callback.clone(), total);
        let (tracker, result) = self.rasterise(file, tracker).await?;
        match &result {
            Ok(pages) => tracker.finish(pages.len(), 0),
            Err(_) => tracker.finish(0, 0),
        }
        result
    }

    /// Page count and first-page size of a PDF, without rendering anything.
    pub async fn inspect(&self, file: SourceFile) -> Result<DocumentInfo, ConvertError> {
        expect_kind(&file, MediaKind::Pdf)?;
        let engine = Arc::clone(&self.engine);
        let password = self.config.password.clone();
        tokio::task::spawn_blocking(move || -> Result<DocumentInfo, ConvertError> {
            let parse_error = |detail: String| ConvertError::Parse {
                name: file.name.clone(),
                detail,
            };
            let document = engine
                .open(&file.bytes, password.as_deref())
                .map_err(|e| parse_error(e.to_string()))?;
            let page_count = document.page_count();
            let first_page_pts = if page_count > 0 {
                Some(
                    document
                        .page_size_pts(0)
                        .map_err(|e| parse_error(e.to_string()))?,
                )
            } else {
                None
            };
            Ok(DocumentInfo {
                name: file.name.clone(),
                size_bytes: file.size(),
                page_count,
                first_page_pts,
            })
        })
        .await
        .map_err(join_error)?
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Units each file will produce: 1 per image, N per PDF, 0 for a PDF
    /// that is over the size limit or fails to parse.
    async fn prescan(
        &self,
        files: &[Arc<SourceFile>],
        kinds: &[MediaKind],
    ) -> Result<usize, ConvertError> {
        let engine = Arc::clone(&self.engine);
        let password = self.config.password.clone();
        let size_limit = self.config.size_limit;
        let jobs: Vec<(Arc<SourceFile>, MediaKind)> =
            files.iter().cloned().zip(kinds.iter().copied()).collect();

        tokio::task::spawn_blocking(move || {
            jobs.iter()
                .map(|(file, kind)| match kind {
                    MediaKind::Image => 1,
                    MediaKind::Pdf if file.size() > size_limit => 0,
                    MediaKind::Pdf => {
                        match batch::count_pages(engine.as_ref(), &file.bytes, password.as_deref()) {
                            Ok(n) => n,
                            Err(e) => {
                                debug!("Pre-scan could not parse '{}': {}", file.name, e);
                                0
                            }
                        }
                    }
                })
                .sum::<usize>()
        })
        .await
        .map_err(join_error)
    }

    /// Convert one PDF on a blocking worker, advancing `tracker` per page.
    ///
    /// The tracker goes into the worker and comes back with the result.
    async fn rasterise(
        &self,
        file: Arc<SourceFile>,
        mut tracker: ProgressTracker,
    ) -> Result<(ProgressTracker, Result<Vec<RasterPage>, ConvertError>), ConvertError> {
        let engine = Arc::clone(&self.engine);
        let password = self.config.password.clone();
        let settings = self.render_settings();

        tokio::task::spawn_blocking(move || {
            let result = batch::convert_document(
                engine.as_ref(),
                &file,
                password.as_deref(),
                settings,
                &mut |_| tracker.advance(),
            );
            (tracker, result)
        })
        .await
        .map_err(join_error)
    }
}

/// Write every result into `dir`, creating it if needed.
///
/// Each file is written to a temporary file in the same directory and then
/// renamed, so a reader never sees a partial file. Results that share a name
/// (`a.png` and `a.jpg` both give `a.pdf`) are saved as `a.pdf`, `a (2).pdf`
/// and so on. The returned paths are the names actually used.
pub async fn write_results(
    results: &[ConversionResult],
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ConvertError> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: dir.clone(),
            source: e,
        })?;

    let files: Vec<(String, Vec<u8>)> = results
        .iter()
        .map(|r| (r.filename.clone(), r.payload.clone()))
        .collect();

    tokio::task::spawn_blocking(move || {
        let mut written = Vec::with_capacity(files.len());
        let mut taken = HashSet::with_capacity(files.len());
        for (requested, payload) in files {
            let filename = unique_filename(&requested, &mut taken);
            if filename != requested {
                warn!("'{}' already written in this batch, saving as '{}'", requested, filename);
            }
            let path = dir.join(&filename);
            let write_failed = |source| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source,
            };

            let mut tmp = tempfile::Builder::new()
                .prefix(".pixpdf-")
                .suffix(".tmp")
                .tempfile_in(&dir)
                .map_err(write_failed)?;
            tmp.write_all(&payload).map_err(write_failed)?;
            tmp.persist(&path).map_err(|e| write_failed(e.error))?;

            debug!("Wrote {} ({} bytes)", path.display(), payload.len());
            written.push(path);
        }
        Ok(written)
    })
    .await
    .map_err(join_error)?
}

/// `name`, or `stem (n).ext` with the smallest `n >= 2` not yet in `taken`.
/// Names are compared case-insensitively.
fn unique_filename(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_lowercase()) {
        return name.to_string();
    }
    let stem = file_stem(name);
    let ext = &name[stem.len()..];
    (2usize..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| taken.insert(candidate.to_lowercase()))
        .unwrap_or_else(|| name.to_string())
}

fn expect_kind(file: &SourceFile, expected: MediaKind) -> Result<(), ConvertError> {
    if file.kind()? == expected {
        Ok(())
    } else {
        Err(ConvertError::UnsupportedType {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
        })
    }
}

fn record_warning(output: &mut BatchOutput, tracker: &ProgressTracker, warning: Warning) {
    let message = warning.to_string();
    warn!("{}", message);
    tracker.warn(&message);
    output.warnings.push(warning);
}

fn join_error(e: tokio::task::JoinError) -> ConvertError {
    ConvertError::Internal(format!("conversion task failed: {}", e))
}
