//! Run configuration.
//!
//! [`RunOptions`] is a builder that carries everything a run needs (the
//! directory layout, the frame skips to average at, keyframe export, the
//! accepted video extensions, and progress reporting) into
//! [`crate::run`] and [`crate::process_video`] as one explicit value.
//!
//! # Example
//!
//! ```no_run
//! use meanframe::{PixelFormat, RunOptions};
//!
//! let options = RunOptions::new()
//!     .with_input_dir("clips")
//!     .with_output_dir("means")
//!     .with_frame_skips([0, 9, 99])
//!     .with_write_keyframes(true)
//!     .with_pixel_format(PixelFormat::Gray8);
//!
//! let summary = meanframe::run(&options)?;
//! println!("{} of {} jobs succeeded", summary.succeeded(), summary.outcomes.len());
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use ffmpeg_next::format::Pixel;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Directory scanned for input videos when none is configured.
pub const DEFAULT_INPUT_DIR: &str = "input";
/// Directory receiving mean images when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output";
/// Directory receiving per-video keyframe folders when none is configured.
pub const DEFAULT_KEYFRAMES_DIR: &str = "keyframes";
/// Frame skips used when none are configured (every 1000th frame).
pub const DEFAULT_FRAME_SKIPS: &[u64] = &[999];
/// Video filename suffixes accepted by default.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".mkv"];
/// Encoding used for mean images and keyframes by default.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Pixel layout frames are converted to before accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB, three channels. This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255, four channels.
    Rgba8,
    /// 8-bit grayscale, one channel.
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Samples per pixel.
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rgb8" | "rgb" => Ok(PixelFormat::Rgb8),
            "rgba8" | "rgba" => Ok(PixelFormat::Rgba8),
            "gray8" | "gray" | "greyscale" | "grayscale" => Ok(PixelFormat::Gray8),
            other => Err(format!("unsupported pixel format: {other}")),
        }
    }
}

/// Configuration for a mean-image run.
///
/// All fields have defaults matching the classic layout: videos in `input/`,
/// mean images in `output/`, keyframes (off) in `keyframes/`, one frame in
/// every thousand sampled, `.mp4`/`.mov`/`.mkv` accepted, JPEG output.
#[derive(Clone)]
pub struct RunOptions {
    pub(crate) input_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) keyframes_dir: PathBuf,
    pub(crate) frame_skips: Vec<u64>,
    pub(crate) write_keyframes: bool,
    pub(crate) supported_extensions: Vec<String>,
    pub(crate) image_extension: String,
    pub(crate) pixel_format: PixelFormat,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often the progress callback fires (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for RunOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunOptions")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("keyframes_dir", &self.keyframes_dir)
            .field("frame_skips", &self.frame_skips)
            .field("write_keyframes", &self.write_keyframes)
            .field("supported_extensions", &self.supported_extensions)
            .field("image_extension", &self.image_extension)
            .field("pixel_format", &self.pixel_format)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOptions {
    /// Create options with the default layout.
    pub fn new() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            keyframes_dir: PathBuf::from(DEFAULT_KEYFRAMES_DIR),
            frame_skips: DEFAULT_FRAME_SKIPS.to_vec(),
            write_keyframes: false,
            supported_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            pixel_format: PixelFormat::default(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Directory scanned (non-recursively) for videos.
    #[must_use]
    pub fn with_input_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Directory that is cleared and refilled with mean images.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Parent directory of the per-video keyframe folders.
    #[must_use]
    pub fn with_keyframes_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.keyframes_dir = dir.into();
        self
    }

    /// Frame skips to produce one mean image each for.
    ///
    /// Duplicates are removed; order of first appearance is kept.
    #[must_use]
    pub fn with_frame_skips<I: IntoIterator<Item = u64>>(mut self, skips: I) -> Self {
        let mut unique = Vec::new();
        for skip in skips {
            if !unique.contains(&skip) {
                unique.push(skip);
            }
        }
        self.frame_skips = unique;
        self
    }

    /// Also save every sampled frame under the keyframes directory.
    #[must_use]
    pub fn with_write_keyframes(mut self, enabled: bool) -> Self {
        self.write_keyframes = enabled;
        self
    }

    /// Filename suffixes (e.g. `".mp4"`) identifying input videos.
    #[must_use]
    pub fn with_supported_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Image encoding for outputs, by extension (`jpg`, `png`, `bmp`, ...).
    /// A leading dot is accepted and the value is lower-cased.
    #[must_use]
    pub fn with_image_extension<S: AsRef<str>>(mut self, extension: S) -> Self {
        self.image_extension = extension
            .as_ref()
            .trim_start_matches('.')
            .to_ascii_lowercase();
        self
    }

    /// Pixel layout frames are converted to before averaging.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Attach a progress callback, fired every
    /// [`batch_size`](RunOptions::with_batch_size) decoded frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn keyframes_dir(&self) -> &Path {
        &self.keyframes_dir
    }

    pub fn frame_skips(&self) -> &[u64] {
        &self.frame_skips
    }

    pub fn write_keyframes(&self) -> bool {
        self.write_keyframes
    }

    pub fn supported_extensions(&self) -> &[String] {
        &self.supported_extensions
    }

    pub fn image_extension(&self) -> &str {
        &self.image_extension
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}
