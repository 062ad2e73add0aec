//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for monitoring long decodes and
//! [`ProgressInfo`] for progress snapshots. Callbacks observe but never halt
//! the work.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meanframe::{ProgressCallback, ProgressInfo, RunOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = RunOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(100);
//! meanframe::run(&options)?;
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding frames and folding them into the running sum.
    FrameAccumulation,
    /// Writing mean images and keyframes.
    ImageExport,
}

/// A snapshot of progress for one (video, frame skip) job.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// The video being processed.
    pub video: PathBuf,
    /// Frame skip of the job.
    pub stride: u64,
    /// Frames decoded so far.
    pub current: u64,
    /// Frames expected, if the container reports an estimate.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Frames sampled so far.
    pub samples: u64,
    /// Wall-clock time elapsed since the job started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] so one callback can be
/// shared through [`RunOptions`](crate::RunOptions) clones.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals while a job runs.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one job and emits callbacks every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    video: PathBuf,
    stride: u64,
    total: Option<u64>,
    current: u64,
    samples: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        video: PathBuf,
        stride: u64,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            video,
            stride,
            total: total.filter(|&t| t > 0),
            current: 0,
            samples: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one decoded frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, sampled: bool) {
        self.current += 1;
        if sampled {
            self.samples += 1;
        }
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    /// Switch to a new phase of the job and report it immediately.
    pub(crate) fn set_operation(&mut self, operation: OperationType) {
        self.operation = operation;
        self.report();
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report();
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        // Container frame counts are estimates; never report past 100 %.
        let percentage = self
            .total
            .map(|t| (self.current.min(t) as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            video: self.video.clone(),
            stride: self.stride,
            current: self.current,
            total: self.total,
            percentage,
            samples: self.samples,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}
