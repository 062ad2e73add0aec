//! # meanframe
//!
//! Compute the per-pixel temporal mean of a video: decode its frames, sum a
//! regularly spaced sample of them, and divide by the sample count to get one
//! averaged still image. Moving objects fade out, static background stays;
//! long exposures, background plates and traffic heat maps fall out of it.
//!
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; images are
//! encoded with [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ### Average one video
//!
//! ```no_run
//! use meanframe::{PixelFormat, VideoFile, compute_mean_image};
//!
//! let mut video = VideoFile::open("input/street.mp4")?;
//! // Frame skip 9: frames 0, 10, 20, ... are averaged.
//! let mean = compute_mean_image(video.frames(PixelFormat::Rgb8)?, 9)?;
//! println!("averaged {} of {} frames", mean.sample_count, mean.total_frames);
//! mean.image.save("street@10.jpg")?;
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```
//!
//! ### Process a directory
//!
//! ```no_run
//! use meanframe::RunOptions;
//!
//! let options = RunOptions::new()
//!     .with_input_dir("input")
//!     .with_output_dir("output")
//!     .with_frame_skips([0, 9, 99]);
//!
//! let summary = meanframe::run(&options)?;
//! for report in summary.reports() {
//!     println!("{}", report.output.display());
//! }
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

pub mod accumulator;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod pipeline;
pub mod progress;
mod utilities;
pub mod video;
pub mod workspace;

pub use accumulator::{
    MeanImage, MeanImageAccumulator, compute_mean_image, compute_mean_image_with,
    expected_sample_count, is_sampled,
};
pub use configuration::{PixelFormat, RunOptions};
pub use error::MeanFrameError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{Frame, FrameShape};
pub use metadata::VideoMetadata;
pub use pipeline::{JobOutcome, JobReport, RunSummary, process_video, run};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use video::{FrameIterator, VideoFile};
