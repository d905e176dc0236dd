//! CLI binary for pixpdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, runs a batch and writes the results to disk.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pixpdf::{
    write_results, BatchOutput, ConversionConfig, ConversionProgressCallback, Converter,
    EngineError, MediaKind, PdfiumEngine, ProgressCallback, ProgressState, RasterEngine,
    RasterFormat, SourceDocument, SourceFile,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the batch is pre-scanned, then
/// a bar counting images and pages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Counting pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_units: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} units  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_units as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn on_progress(&self, state: ProgressState) {
        if self.bar.length() != Some(state.total as u64) {
            self.bar.set_length(state.total as u64);
        }
        self.bar.set_position(state.completed as u64);
    }

    fn on_warning(&self, message: &str) {
        self.bar.println(format!("  {} {}", red("✗"), message));
    }

    fn on_batch_complete(&self, _results: usize, _warnings: usize) {
        self.bar.finish_and_clear();
    }
}

/// Stand-in engine for runs with no PDF input, so image-only batches work
/// on machines without pdfium.
struct NoPdfEngine;

impl RasterEngine for NoPdfEngine {
    fn open<'a>(
        &'a self,
        _bytes: &'a [u8],
        _password: Option<&'a str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, EngineError> {
        Err(EngineError::Open("pdfium is not loaded".into()))
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Each image becomes a PDF page of exactly its size; each PDF page an image
  pixpdf scan.png report.pdf -o out/

  # Lower DPI for very tall pages (600 is the default)
  pixpdf --dpi 300 poster.pdf

  # JPEG output instead of PNG
  pixpdf --format jpeg slides.pdf

  # All images into one PDF, one page per image
  pixpdf --merge page1.jpg page2.jpg page3.jpg -o out/

  # Page count and size without rendering
  pixpdf --inspect-only report.pdf

  # Machine-readable summary
  pixpdf --json report.pdf > summary.json

LIMITS:
  Pages are rendered at DPI/72 pixels per point. A page whose rendered
  width or height would exceed --max-canvas (32767 px) fails with a
  warning; lower --dpi or split the PDF. PDFs larger than --size-limit-mb
  (50 MB) are skipped.

ENVIRONMENT VARIABLES:
  PIXPDF_PDFIUM_LIB   Directory containing the pdfium shared library
  PIXPDF_DPI, PIXPDF_FORMAT, PIXPDF_OUTPUT_DIR, …  Same as the flags
  RUST_LOG            Override the log filter
"#;

/// Convert images to exactly-sized PDFs and PDF pages to images.
#[derive(Parser, Debug)]
#[command(
    name = "pixpdf",
    version,
    about = "Convert images to exactly-sized PDFs and PDF pages to high-resolution images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image and PDF files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write results into.
    #[arg(short, long, env = "PIXPDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rendering DPI for PDF pages (72–2400).
    #[arg(long, env = "PIXPDF_DPI", default_value_t = pixpdf::config::DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(72..=2400))]
    dpi: u32,

    /// Largest rendered width or height in pixels.
    #[arg(long, env = "PIXPDF_MAX_CANVAS", default_value_t = pixpdf::config::DEFAULT_CANVAS_LIMIT)]
    max_canvas: u32,

    /// Skip PDFs larger than this many MiB.
    #[arg(long, env = "PIXPDF_SIZE_LIMIT_MB", default_value_t = 50)]
    size_limit_mb: u64,

    /// Encoding of rendered pages.
    #[arg(long, env = "PIXPDF_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Assemble all inputs (images only) into one PDF.
    #[arg(long, env = "PIXPDF_MERGE")]
    merge: bool,

    /// Password for encrypted PDFs.
    #[arg(long, env = "PIXPDF_PASSWORD")]
    password: Option<String>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PIXPDF_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print page count and first page size of each PDF, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "PIXPDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PIXPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIXPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PIXPDF_QUIET")]
    quiet: bool,
}

impl Cli {
    /// The bar is driven by batch events, which inspect-only never emits.
    fn shows_progress(&self) -> bool {
        !self.quiet && !self.no_progress && !self.json && !self.inspect_only
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatArg> for RasterFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => RasterFormat::Png,
            FormatArg::Jpeg => RasterFormat::Jpeg,
            FormatArg::Webp => RasterFormat::Webp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight with the progress bar or the inspect report, so
    // they only show for a plain conversion run.
    let show_progress = cli.shows_progress();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.inspect_only {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read inputs ──────────────────────────────────────────────────────
    let files = cli
        .inputs
        .iter()
        .map(|p| SourceFile::from_path(p).with_context(|| format!("Failed to read {:?}", p)))
        .collect::<Result<Vec<_>>>()?;

    // ── Bind the engine ──────────────────────────────────────────────────
    let needs_pdfium = files
        .iter()
        .any(|f| matches!(f.kind(), Ok(MediaKind::Pdf)));
    let engine: Arc<dyn RasterEngine> = if needs_pdfium {
        Arc::new(
            PdfiumEngine::bind(cli.pdfium_lib.as_deref()).context("Failed to load pdfium")?,
        )
    } else {
        Arc::new(NoPdfEngine)
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let converter = Converter::new(engine, build_config(&cli, progress_cb)?);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            let name = file.name.clone();
            let info = converter
                .inspect(file)
                .await
                .with_context(|| format!("Failed to inspect {}", name))?;
            reports.push(info);
        }

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).context("Failed to serialize report")?
            );
        } else {
            for info in &reports {
                println!("File:         {}", info.name);
                println!("Size:         {} bytes", info.size_bytes);
                println!("Pages:        {}", info.page_count);
                if let Some((w, h)) = info.first_page_pts {
                    println!("First page:   {:.1} x {:.1} pt", w, h);
                }
            }
        }
        return Ok(());
    }

    // ── Merge mode ───────────────────────────────────────────────────────
    let output = if cli.merge {
        let doc = converter
            .images_to_pdf(files)
            .await
            .context("Failed to assemble PDF")?;
        BatchOutput {
            results: vec![doc.into()],
            warnings: Vec::new(),
        }
    } else {
        converter
            .convert_batch(files)
            .await
            .context("Conversion failed")?
    };

    // ── Write results ────────────────────────────────────────────────────
    let written = write_results(&output.results, &cli.output_dir)
        .await
        .context("Failed to write results")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        for path in &written {
            eprintln!("  {} {}", green("✓"), dim(&path.display().to_string()));
        }
        if !show_progress {
            for w in &output.warnings {
                eprintln!("  {} {}", red("✗"), w);
            }
        }
        eprintln!(
            "{} {} files written to {}{}",
            if output.warnings.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&written.len().to_string()),
            bold(&cli.output_dir.display().to_string()),
            if output.warnings.is_empty() {
                String::new()
            } else {
                format!("  ({} warnings)", red(&output.warnings.len().to_string()))
            },
        );
    }

    if output.results.is_empty() {
        anyhow::bail!("No files were converted");
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .canvas_limit(cli.max_canvas)
        .size_limit(cli.size_limit_mb.saturating_mul(1024 * 1024))
        .raster_format(cli.format.into());

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
