//! CLI binary for doc2any.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionRequest`s / `BatchOptions` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use doc2any::{
    convert_batch, resolve_converter, sink, BatchOptions, BatchProgressCallback, ConvertOptions,
    ConversionRequest, ExportFormat, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-document
/// log lines using [indicatif]. Designed to work correctly when documents
/// complete out-of-order (concurrent mode).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-document wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Contacting backend…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, n: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&n)
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_sources: usize) {
        self.activate_bar(total_sources);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_sources} documents…"))
        ));
    }

    fn on_source_start(&self, n: usize, _total: usize, source: &str) {
        self.start_times.lock().unwrap().insert(n, Instant::now());
        self.bar.set_message(source.to_string());
    }

    fn on_source_complete(&self, n: usize, total: usize, source: &str, content_len: usize) {
        let elapsed = self.elapsed_secs(n);
        self.bar.println(format!(
            "  {} [{:>3}/{:<3}] {}  {}  {}",
            green("✓"),
            n,
            total,
            source,
            dim(&format!("{content_len:>6} bytes")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_source_error(&self, n: usize, total: usize, source: &str, error: &str) {
        let elapsed = self.elapsed_secs(n);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} [{:>3}/{:<3}] {}  {}  {}",
            red("✗"),
            n,
            total,
            source,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_sources: usize, succeeded: usize) {
        let failed = total_sources.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total_sources,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Single document to stdout
  doc2any document.pdf

  # Single document from a URL
  doc2any https://arxiv.org/pdf/2408.09869

  # A batch into an output directory, sequentially
  doc2any a.pdf b.docx c.pptx -o out/

  # The same batch with 8 parallel conversions
  doc2any a.pdf b.docx c.pptx -o out/ --concurrent --max-workers 8

  # HTML export with OCR for scanned inputs
  doc2any scan.pdf --format html --ocr -o out/

  # Machine-readable batch report
  doc2any a.pdf b.pdf --json > report.json

EXIT CODES:
  0  every document converted successfully
  1  at least one document failed (the rest were still processed)

ENVIRONMENT VARIABLES:
  DOC2ANY_BACKEND_URL   Conversion backend endpoint (default http://localhost:5001)
  DOC2ANY_OUTPUT_DIR    Default output directory
"#;

/// Convert documents to Markdown, JSON, HTML or DocTags.
#[derive(Parser, Debug)]
#[command(
    name = "doc2any",
    version,
    about = "Convert documents to Markdown, JSON, HTML or DocTags",
    long_about = "Convert documents (local files or URLs) to Markdown, JSON, HTML or DocTags \
by delegating parsing to a Docling backend. Batches run under a bounded worker pool; \
one failing document never aborts the rest.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// One or more local paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    sources: Vec<String>,

    /// Write exported files here instead of stdout.
    ///
    /// Required implicitly for batches: with more than one source and no
    /// directory given, `output/` is used.
    #[arg(short, long, env = "DOC2ANY_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Export format.
    #[arg(short, long, env = "DOC2ANY_FORMAT", value_enum, default_value = "markdown")]
    format: FormatArg,

    /// Convert documents in parallel (default: sequential).
    #[arg(long, env = "DOC2ANY_CONCURRENT")]
    concurrent: bool,

    /// Worker-pool size when --concurrent is set.
    #[arg(long, env = "DOC2ANY_MAX_WORKERS", default_value_t = 4)]
    max_workers: usize,

    /// Run OCR on image-bearing pages.
    #[arg(long, env = "DOC2ANY_OCR")]
    ocr: bool,

    /// Disable table-structure detection.
    #[arg(long, env = "DOC2ANY_NO_TABLE_STRUCTURE")]
    no_table_structure: bool,

    /// Per-document timeout in seconds.
    #[arg(long, env = "DOC2ANY_TIMEOUT")]
    timeout: Option<u64>,

    /// Conversion backend endpoint.
    #[arg(long, env = "DOC2ANY_BACKEND_URL")]
    backend_url: Option<String>,

    /// Print the batch report as JSON instead of writing files.
    #[arg(long, env = "DOC2ANY_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOC2ANY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2ANY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and exported content.
    #[arg(short, long, env = "DOC2ANY_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Markdown,
    Json,
    Html,
    Doctags,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Html => ExportFormat::Html,
            FormatArg::Doctags => ExportFormat::Doctags,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Build requests ───────────────────────────────────────────────────
    let format: ExportFormat = cli.format.into();
    let options = ConvertOptions::builder()
        .ocr_enabled(cli.ocr)
        .table_structure_enabled(!cli.no_table_structure)
        .build();

    let requests: Vec<ConversionRequest> = cli
        .sources
        .iter()
        .map(|s| ConversionRequest::new(s.clone(), format).with_options(options.clone()))
        .collect();

    let converter =
        resolve_converter(cli.backend_url.as_deref()).context("Failed to set up backend")?;

    // ── Batch options ────────────────────────────────────────────────────
    let max_workers = if cli.concurrent { cli.max_workers } else { 1 };
    let mut builder = BatchOptions::builder().max_workers(max_workers);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        builder = builder.progress(cb as ProgressCallback);
    }
    let batch_options = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = convert_batch(converter, requests, &batch_options)
        .await
        .context("Batch conversion failed")?;

    // ── Emit results ─────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if cli.output_dir.is_none() && report.outcomes.len() == 1 {
        // Single conversion, no directory: behave like a filter.
        let outcome = &report.outcomes[0];
        match &outcome.content {
            Some(content) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(content.as_bytes())
                    .context("Failed to write to stdout")?;
                if !content.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
            None => {
                eprintln!(
                    "{} {}: {}",
                    red("✗"),
                    outcome.source,
                    outcome.error.as_deref().unwrap_or("conversion failed")
                );
            }
        }
    } else {
        let out_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("output"));

        for outcome in report.outcomes.iter().filter(|o| o.is_success()) {
            let path = sink::write_outcome(&out_dir, outcome, format)
                .await
                .with_context(|| format!("Failed to save output for '{}'", outcome.source))?;
            if !cli.quiet && !show_progress {
                eprintln!("Saved {}", path.display());
            }
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} succeeded, {} failed  {}  →  {}",
                if report.is_all_success() {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                report.succeeded_count,
                report.failed_count,
                dim(&format!("{}ms", report.total_duration_ms)),
                bold(&out_dir.display().to_string()),
            );
        }
    }

    if !report.is_all_success() {
        std::process::exit(1);
    }
    Ok(())
}
