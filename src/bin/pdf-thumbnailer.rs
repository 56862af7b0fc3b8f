//! CLI binary for pdf-thumbnailer.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ThumbnailConfig` and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_thumbnailer::{
    generate, RunReport, ThumbnailConfig, ThumbnailError,
    ThumbnailProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per finished file. Files complete out
/// of order, so every event is keyed by its source path.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ThumbnailProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>4}/{len} files  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_files as u64);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn on_file_start(&self, source: &Path) {
        self.bar.set_message(short_name(source));
    }

    fn on_file_complete(&self, source: &Path, output: &Path) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            short_name(source),
            dim(&format!("→ {}", output.display())),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, source: &Path, error: &str) {
        let msg = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            short_name(source),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total_files: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Thumbnail every PDF below ~/papers into ~/thumbs
  pdf-thumbnailer --path ~/papers --destination ~/thumbs

  # Short flags, four workers, smaller images
  pdf-thumbnailer -p ./in -d ./out -c 4 --dpi 72 --max-size 512

  # Also pick up .PDF files, emit a JSON report, fail CI on any error
  pdf-thumbnailer -p ./in -d ./out --ignore-case --json --fail-on-error

OUTPUT:
  One <name>.png per <name>.pdf, written flat into the destination.
  Existing thumbnails are replaced.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         libpdfium file or directory (same as --pdfium-lib)
  RUST_LOG                Override the log filter (e.g. pdf_thumbnailer=debug)
"#;

/// Generate PNG thumbnails for the first page of every PDF in a directory tree.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-thumbnailer",
    version,
    about = "Generate thumbnail images for the PDFs in a directory",
    long_about = "Create thumbnail images for PDF files to easily distinguish them without \
opening each file. Every PDF below --path is rendered (first page only) to a PNG in \
--destination.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory to scan for PDF files (recursively).
    #[arg(short, long, env = "PDF_THUMBNAILER_PATH")]
    path: String,

    /// Directory to store the generated thumbnails in.
    #[arg(short, long, env = "PDF_THUMBNAILER_DESTINATION")]
    destination: String,

    /// Maximum files rendered at once; 0 means one worker per file.
    #[arg(short, long, env = "PDF_THUMBNAILER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF_THUMBNAILER_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Longest allowed edge of a thumbnail, in pixels.
    #[arg(long, env = "PDF_THUMBNAILER_MAX_SIZE", default_value_t = 2000)]
    max_size: u32,

    /// Match .PDF, .Pdf, … as well as .pdf.
    #[arg(long, env = "PDF_THUMBNAILER_IGNORE_CASE")]
    ignore_case: bool,

    /// Follow symbolic links while scanning.
    #[arg(long, env = "PDF_THUMBNAILER_FOLLOW_LINKS")]
    follow_links: bool,

    /// User password tried on encrypted PDFs.
    #[arg(long, env = "PDF_THUMBNAILER_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium, or to the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDF_THUMBNAILER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_THUMBNAILER_NO_PROGRESS")]
    no_progress: bool,

    /// Exit with a non-zero status if any thumbnail failed.
    #[arg(long, env = "PDF_THUMBNAILER_FAIL_ON_ERROR")]
    fail_on_error: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_THUMBNAILER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_THUMBNAILER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports every file; keep library logs to
    // errors while it is on screen.
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

    match run(&cli, show_progress).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<ExitCode> {
    // Config errors are reported before the spinner starts.
    let mut config = build_config(cli)?;
    let bar = show_progress.then(CliProgressCallback::new);
    config.progress_callback = bar
        .clone()
        .map(|cb| cb as Arc<dyn ThumbnailProgressCallback>);

    let report = match generate(&config).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(cb) = bar {
                cb.bar.finish_and_clear();
            }
            return Err(match e {
                e @ (ThumbnailError::EmptyArgument { .. }
                | ThumbnailError::NotFound { .. }
                | ThumbnailError::NotADirectory { .. }) => anyhow::Error::new(e),
                e => anyhow::Error::new(e).context("Thumbnail generation failed"),
            });
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report, &config.destination);
    }

    if cli.fail_on_error && report.stats.failed > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ThumbnailConfig`.
fn build_config(cli: &Cli) -> Result<ThumbnailConfig> {
    let concurrency = match cli.concurrency {
        Some(n) => Some(n),
        None => Some(pdf_thumbnailer::config::default_concurrency()),
    };

    let mut builder = ThumbnailConfig::builder()
        .source_dir(cli.path.trim())
        .destination(cli.destination.trim())
        .concurrency(concurrency)
        .dpi(cli.dpi)
        .max_size(cli.max_size)
        .ignore_case(cli.ignore_case)
        .follow_links(cli.follow_links);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }

    Ok(builder.build()?)
}

fn print_summary(report: &RunReport, destination: &Path) {
    let stats = &report.stats;

    for issue in &report.scan_issues {
        eprintln!(
            "  {} {}",
            yellow("⚠"),
            dim(&format!("skipped while scanning: {}", issue.detail))
        );
    }
    for collision in &report.collisions {
        eprintln!(
            "  {} {} sources share {}",
            yellow("⚠"),
            collision.sources.len(),
            bold(&collision.output.display().to_string())
        );
    }

    if stats.discovered == 0 {
        eprintln!("{} no PDF files found", yellow("⚠"));
        return;
    }

    eprintln!(
        "{}  {}/{} thumbnails  {}ms  →  {}",
        if stats.failed == 0 {
            green("✔")
        } else if stats.succeeded == 0 {
            red("✘")
        } else {
            yellow("⚠")
        },
        stats.succeeded,
        stats.discovered,
        stats.duration_ms,
        bold(&destination.display().to_string()),
    );
    if stats.failed > 0 {
        eprintln!("   {} failed:", red(&stats.failed.to_string()));
        for failed in report.failures() {
            if let Some(ref e) = failed.error {
                eprintln!("   {} {}", dim(&failed.source.display().to_string()), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdf-thumbnailer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn blank_path_fails_before_any_progress_is_attached() {
        let err = build_config(&parse(&["-p", "   ", "-d", "out"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ThumbnailError>(),
            Some(ThumbnailError::EmptyArgument { name: "path" })
        ));
    }

    #[test]
    fn built_config_carries_no_callback() {
        let config = build_config(&parse(&["-p", "in", "-d", "out", "-c", "0"])).unwrap();
        assert!(config.progress_callback.is_none());
        assert_eq!(config.concurrency, None);
        assert_eq!(config.source_dir, PathBuf::from("in"));
    }
}
