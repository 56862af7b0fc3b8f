//! Result types returned from a thumbnail run.

use crate::error::{FileError, ThumbnailError};
use crate::pipeline::scan::ScanIssue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailResult {
    /// The PDF that was processed.
    pub source: PathBuf,
    /// Where its thumbnail was (or would have been) written.
    pub output: PathBuf,
    /// `None` when the thumbnail was written.
    pub error: Option<FileError>,
    /// Wall-clock time spent on this file, including waiting for a worker.
    pub duration_ms: u64,
}

impl ThumbnailResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Two or more sources whose thumbnails share one output name.
///
/// Every source is still processed; whichever finishes last owns the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCollision {
    pub output: PathBuf,
    pub sources: Vec<PathBuf>,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// PDFs found by the scanner, equal to the number of units launched.
    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries the scanner could not read.
    pub scan_issues: usize,
    pub duration_ms: u64,
}

/// Aggregate report of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per discovered PDF, sorted by source path.
    pub results: Vec<ThumbnailResult>,
    pub scan_issues: Vec<ScanIssue>,
    pub collisions: Vec<OutputCollision>,
    pub stats: RunStats,
}

impl RunReport {
    /// Build the report, deriving its counters from the parts.
    pub fn new(
        mut results: Vec<ThumbnailResult>,
        scan_issues: Vec<ScanIssue>,
        collisions: Vec<OutputCollision>,
        duration_ms: u64,
    ) -> Self {
        results.sort_by(|a, b| a.source.cmp(&b.source));
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let stats = RunStats {
            discovered: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            scan_issues: scan_issues.len(),
            duration_ms,
        };
        Self {
            results,
            scan_issues,
            collisions,
            stats,
        }
    }

    /// Results that did not produce a thumbnail.
    pub fn failures(&self) -> impl Iterator<Item = &ThumbnailResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Treat any per-file failure as an error.
    pub fn into_result(self) -> Result<Self, ThumbnailError> {
        if self.stats.failed > 0 {
            Err(ThumbnailError::PartialFailure {
                failed: self.stats.failed,
                total: self.stats.discovered,
            })
        } else {
            Ok(self)
        }
    }
}
