//! Fan-out / fan-in core: one unit of work per discovered PDF.
//!
//! [`dispatch`] spawns every task onto the tokio runtime immediately. When a
//! concurrency cap is configured, a unit first waits for a semaphore permit,
//! which turns the unbounded fan-out into a fixed-size worker pool without
//! changing the completion contract. The blocking part of a unit (pdfium,
//! PNG encoding, file I/O) runs on `spawn_blocking`.
//!
//! Each unit records a [`ThumbnailResult`] and then drops its
//! [`CompletionGuard`](super::barrier::CompletionGuard); `dispatch` returns
//! once the [`CompletionBarrier`] has heard from every unit. Failures and
//! panics stay inside the unit that hit them.

use crate::error::FileError;
use crate::pipeline::barrier::CompletionBarrier;
use crate::pipeline::render::{PageRenderer, FIRST_PAGE};
use crate::pipeline::write::{thumbnail_path, write_thumbnail};
use crate::progress::ProgressCallback;
use crate::report::{OutputCollision, ThumbnailResult};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// One PDF to thumbnail, owned by exactly one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTask {
    pub source: PathBuf,
    pub dest_dir: PathBuf,
    /// `dest_dir/<stem(source)>.png`
    pub output: PathBuf,
}

impl RenderTask {
    pub fn new(source: PathBuf, dest_dir: &Path) -> Self {
        let output = thumbnail_path(dest_dir, &source);
        Self {
            source,
            dest_dir: dest_dir.to_path_buf(),
            output,
        }
    }
}

/// Turn scanned files into tasks writing into `dest_dir`.
pub fn plan_tasks(files: Vec<PathBuf>, dest_dir: &Path) -> Vec<RenderTask> {
    files
        .into_iter()
        .map(|source| RenderTask::new(source, dest_dir))
        .collect()
}

/// Group tasks whose thumbnails would overwrite each other.
pub fn find_collisions(tasks: &[RenderTask]) -> Vec<OutputCollision> {
    let mut by_output: BTreeMap<&Path, Vec<PathBuf>> = BTreeMap::new();
    for task in tasks {
        by_output
            .entry(task.output.as_path())
            .or_default()
            .push(task.source.clone());
    }
    by_output
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(output, sources)| OutputCollision {
            output: output.to_path_buf(),
            sources,
        })
        .collect()
}

/// Knobs for [`dispatch`].
#[derive(Clone, Default)]
pub struct DispatchOptions {
    /// Worker cap; `None` (or zero) runs every unit at once.
    pub concurrency: Option<usize>,
    pub progress: Option<ProgressCallback>,
}

/// Run every task to completion and return one result per task.
///
/// Returns only after all launched units have signalled the completion
/// barrier. The order of the returned results is unspecified.
pub async fn dispatch(
    tasks: Vec<RenderTask>,
    renderer: Arc<dyn PageRenderer>,
    options: &DispatchOptions,
) -> Vec<ThumbnailResult> {
    let total = tasks.len();
    let barrier = CompletionBarrier::new(total);
    let permits = options
        .concurrency
        .filter(|&n| n > 0)
        .map(|n| Arc::new(Semaphore::new(n.min(Semaphore::MAX_PERMITS))));
    let results = Arc::new(Mutex::new(Vec::with_capacity(total)));

    info!(
        "Dispatching {} files (concurrency: {})",
        total,
        options
            .concurrency
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );

    for task in tasks {
        let guard = barrier.guard();
        let renderer = Arc::clone(&renderer);
        let permits = permits.clone();
        let progress = options.progress.clone();
        let results = Arc::clone(&results);

        tokio::spawn(async move {
            let _guard = guard;
            let start = Instant::now();
            let source = task.source.clone();
            let output = task.output.clone();

            let outcome = AssertUnwindSafe(run_unit(task, renderer, permits, progress.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(FileError::Aborted(panic_message(&*panic))));

            let error = match outcome {
                Ok(written) => {
                    debug!("Thumbnail ready: {}", written.display());
                    None
                }
                Err(e) => {
                    warn!("Failed to thumbnail {}: {}", source.display(), e);
                    Some(e)
                }
            };

            let result = ThumbnailResult {
                source,
                output,
                error,
                duration_ms: start.elapsed().as_millis() as u64,
            };

            let event = progress.map(|cb| {
                let detail = result.error.as_ref().map(ToString::to_string);
                (cb, result.source.clone(), result.output.clone(), detail)
            });

            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(result);

            // The result is already recorded; a panicking callback only
            // loses its own event.
            if let Some((cb, source, output, detail)) = event {
                let notified = std::panic::catch_unwind(AssertUnwindSafe(|| match detail {
                    None => cb.on_file_complete(&source, &output),
                    Some(ref e) => cb.on_file_error(&source, e),
                }));
                if let Err(panic) = notified {
                    warn!(
                        "Progress callback panicked for {}: {}",
                        source.display(),
                        panic_message(&*panic)
                    );
                }
            }
        });
    }

    barrier.wait().await;

    let mut results = results.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *results)
}

/// Body of one unit: wait for a worker slot, then render and write.
async fn run_unit(
    task: RenderTask,
    renderer: Arc<dyn PageRenderer>,
    permits: Option<Arc<Semaphore>>,
    progress: Option<ProgressCallback>,
) -> Result<PathBuf, FileError> {
    let _permit = match permits {
        Some(semaphore) => Some(
            semaphore
                .acquire_owned()
                .await
                .map_err(|e| FileError::Aborted(e.to_string()))?,
        ),
        None => None,
    };

    if let Some(ref cb) = progress {
        cb.on_file_start(&task.source);
    }

    tokio::task::spawn_blocking(move || render_and_write(&task, renderer.as_ref()))
        .await
        .map_err(|e| FileError::Aborted(format!("render task failed: {e}")))?
}

fn render_and_write(task: &RenderTask, renderer: &dyn PageRenderer) -> Result<PathBuf, FileError> {
    let image = renderer.render_page(&task.source, FIRST_PAGE)?;
    let base_name = task
        .source
        .file_name()
        .unwrap_or(task.source.as_os_str());
    Ok(write_thumbnail(image, &task.dest_dir, base_name)?)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unit panicked".to_string())
}
