//! Whole-run driver.
//!
//! A run scans the input directory, clears the output directory, and then
//! executes one job per (video, frame skip) pair. Each job decodes the video
//! from the start, folds its frames into a [`MeanImageAccumulator`], and
//! writes the mean image. Jobs are independent: a failing job is logged and
//! recorded in the [`RunSummary`], and the run moves on to the next one.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    accumulator::{MeanImageAccumulator, compute_mean_image_with},
    configuration::RunOptions,
    error::MeanFrameError,
    frame::FrameShape,
    progress::{OperationType, ProgressTracker},
    video::VideoFile,
    workspace,
};

/// Result of one successful (video, frame skip) job.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// The processed video.
    pub video: PathBuf,
    /// Frame skip of the job.
    pub stride: u64,
    /// Frames decoded.
    pub total_frames: u64,
    /// Frames averaged.
    pub sample_count: u64,
    /// Geometry of the frames and of the mean image.
    pub frame_shape: FrameShape,
    /// Where the mean image was written.
    pub output: PathBuf,
    /// Number of sampled frames saved as keyframes (0 when disabled).
    pub keyframes_written: u64,
}

/// Outcome of one job within a run.
#[derive(Debug)]
pub struct JobOutcome {
    /// The video the job was for.
    pub video: PathBuf,
    /// Frame skip of the job.
    pub stride: u64,
    /// What happened.
    pub result: Result<JobReport, MeanFrameError>,
}

/// Everything a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Videos found in the input directory, in processing order.
    pub videos: Vec<PathBuf>,
    /// One entry per (video, frame skip) pair, in processing order.
    pub outcomes: Vec<JobOutcome>,
}

impl RunSummary {
    /// Number of jobs that produced a mean image.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of jobs that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Successful job reports.
    pub fn reports(&self) -> impl Iterator<Item = &JobReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

/// Compute and save the mean image of one video at one frame skip.
///
/// The mean image goes to `<output_dir>/<basename>@<stride + 1>.<ext>`; the
/// output directory is created if missing but not cleared.
///
/// `<keyframes_dir>/<basename>/` is removed before the video is opened. When
/// keyframe writing is enabled it is recreated empty and every sampled frame
/// of this job is saved into it.
///
/// # Errors
///
/// Any failure to open, decode, average or encode. In particular
/// [`MeanFrameError::EmptySample`] when nothing could be sampled.
pub fn process_video(
    video_path: &Path,
    stride: u64,
    options: &RunOptions,
) -> Result<JobReport, MeanFrameError> {
    let extension = options.image_extension();
    workspace::check_image_extension(extension)?;

    let keyframe_dir = workspace::keyframe_directory(options.keyframes_dir(), video_path);
    let keyframe_dir = if options.write_keyframes() {
        workspace::reset_directory(&keyframe_dir)?;
        Some(keyframe_dir)
    } else {
        workspace::remove_directory(&keyframe_dir)?;
        None
    };

    let mut video = VideoFile::open(video_path)?;
    let metadata = video.metadata().clone();
    let shape = metadata.frame_shape(options.pixel_format());
    log::info!(
        "{}: {}x{}, {} channel(s), ~{} frames",
        video_path.display(),
        shape.width,
        shape.height,
        shape.channels,
        metadata.frame_count,
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameAccumulation,
        video_path.to_path_buf(),
        stride,
        Some(metadata.frame_count),
        options.batch_size,
    );

    let mut keyframes_written = 0_u64;
    let mean = {
        let frames = video.frames(options.pixel_format())?;
        compute_mean_image_with(
            MeanImageAccumulator::with_shape(stride, shape),
            frames,
            |frame_index, frame, sampled| {
                if sampled {
                    log::trace!("{frame_index:06}: sampled");
                    if let Some(dir) = &keyframe_dir {
                        frame.save(workspace::keyframe_path(dir, frame_index, extension))?;
                        keyframes_written += 1;
                    }
                }
                tracker.advance(sampled);
                Ok(())
            },
        )?
    };
    drop(video);

    log::info!(
        "Total number of frames = {}, sampled frames = {}",
        mean.total_frames,
        mean.sample_count
    );

    tracker.set_operation(OperationType::ImageExport);
    fs::create_dir_all(options.output_dir())?;
    let output = workspace::mean_image_path(options.output_dir(), video_path, stride, extension);
    log::info!("Writing mean image to {}", output.display());
    mean.image.save(&output)?;
    tracker.finish();

    Ok(JobReport {
        video: video_path.to_path_buf(),
        stride,
        total_frames: mean.total_frames,
        sample_count: mean.sample_count,
        frame_shape: mean.image.shape(),
        output,
        keyframes_written,
    })
}

/// Process every video in the input directory at every configured frame skip.
///
/// Videos are processed in file name order, frame skips in configured order.
/// Every job clears its video's keyframe folder, so with keyframe writing
/// enabled the folder ends up holding the frames of the last frame skip.
///
/// # Errors
///
/// Only setup failures abort the run: an unsupported output extension, an
/// unreadable input directory, or an output directory that cannot be reset.
/// Job failures are reported in the returned [`RunSummary`].
pub fn run(options: &RunOptions) -> Result<RunSummary, MeanFrameError> {
    workspace::check_image_extension(options.image_extension())?;

    let videos = workspace::scan_videos(options.input_dir(), options.supported_extensions())?;
    if videos.is_empty() {
        log::warn!(
            "No videos matching {:?} in {}",
            options.supported_extensions(),
            options.input_dir().display()
        );
    }

    workspace::reset_directory(options.output_dir())?;

    let mut summary = RunSummary {
        videos: videos.clone(),
        outcomes: Vec::new(),
    };

    for video in &videos {
        for &stride in options.frame_skips() {
            log::info!("Analyzing {} @ frame skip = {stride}", video.display());
            let result = process_video(video, stride, options);

            if let Err(error) = &result {
                log::error!(
                    "Skipping {} @ frame skip = {stride}: {error}",
                    video.display()
                );
            }

            summary.outcomes.push(JobOutcome {
                video: video.clone(),
                stride,
                result,
            });
        }
    }

    log::info!(
        "Run finished: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    Ok(summary)
}
