//! Top-level entry points: validate, scan, dispatch, report.

use crate::config::ThumbnailConfig;
use crate::error::ThumbnailError;
use crate::pipeline::dispatch::{dispatch, find_collisions, plan_tasks, DispatchOptions};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::scan::scan;
use crate::report::RunReport;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Thumbnail every PDF under `config.source_dir` into `config.destination`.
///
/// This is the primary entry point for the library. It binds pdfium once
/// and shares the binding with every unit of work.
///
/// # Returns
/// `Ok(RunReport)` once every discovered file has settled, even if some of
/// them failed (check `report.stats.failed`, or call
/// [`RunReport::into_result`]).
///
/// # Errors
/// Returns `Err(ThumbnailError)` only when the run cannot start:
/// - source or destination missing, empty, or not a directory
/// - pdfium cannot be bound
/// - the source root cannot be traversed
pub async fn generate(config: &ThumbnailConfig) -> Result<RunReport, ThumbnailError> {
    config.validate_paths()?;

    let renderer = PdfiumRenderer::bind(config.pdfium_library.as_deref())?
        .with_settings(config.render_settings())
        .with_password(config.password.clone());

    run(config, Arc::new(renderer)).await
}

/// Like [`generate`], but with a caller-supplied render backend.
pub async fn generate_with(
    config: &ThumbnailConfig,
    renderer: Arc<dyn PageRenderer>,
) -> Result<RunReport, ThumbnailError> {
    config.validate_paths()?;
    run(config, renderer).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(config: &ThumbnailConfig) -> Result<RunReport, ThumbnailError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ThumbnailError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(config))
}

async fn run(
    config: &ThumbnailConfig,
    renderer: Arc<dyn PageRenderer>,
) -> Result<RunReport, ThumbnailError> {
    let start = Instant::now();
    info!(
        "Generating thumbnails: {} → {}",
        config.source_dir.display(),
        config.destination.display()
    );

    // ── Step 1: Scan ─────────────────────────────────────────────────────
    let root = config.source_dir.clone();
    let options = config.scan_options();
    let found = tokio::task::spawn_blocking(move || scan(&root, &options))
        .await
        .map_err(|e| ThumbnailError::Internal(format!("Scan task panicked: {e}")))??;

    // ── Step 2: Plan ─────────────────────────────────────────────────────
    let tasks = plan_tasks(found.files, &config.destination);
    let collisions = find_collisions(&tasks);
    for collision in &collisions {
        warn!(
            "{} sources map to {}; the last one to finish wins",
            collision.sources.len(),
            collision.output.display()
        );
    }

    let total = tasks.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 3: Fan out, fan in ──────────────────────────────────────────
    let options = DispatchOptions {
        concurrency: config.concurrency,
        progress: config.progress_callback.clone(),
    };
    let results = dispatch(tasks, renderer, &options).await;

    // ── Step 4: Report ───────────────────────────────────────────────────
    let report = RunReport::new(
        results,
        found.issues,
        collisions,
        start.elapsed().as_millis() as u64,
    );

    info!(
        "Run complete: {}/{} thumbnails, {} failed, {} scan issues, {}ms",
        report.stats.succeeded,
        report.stats.discovered,
        report.stats.failed,
        report.stats.scan_issues,
        report.stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, report.stats.succeeded);
    }

    Ok(report)
}
