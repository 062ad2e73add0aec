//! Error types for the `meanframe` crate.
//!
//! This module defines [`MeanFrameError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (file
//! paths, frame indices, shapes) to diagnose a failed job from the run summary
//! alone.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::frame::FrameShape;

/// The unified error type for all `meanframe` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MeanFrameError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A decoded frame does not have the geometry of the frames before it.
    #[error("Frame {frame_index} has shape {found}, expected {expected}")]
    FrameShapeMismatch {
        /// Shape fixed by the first frame (or the decoder's report).
        expected: FrameShape,
        /// Shape of the offending frame.
        found: FrameShape,
        /// Zero-based index of the offending frame.
        frame_index: u64,
    },

    /// Raw pixel data does not describe a valid frame.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// No frame was sampled, so there is nothing to average.
    ///
    /// Raised when the video is empty, when decoding fails before the first
    /// frame, and never silently replaced by a division by zero.
    #[error("No frames sampled (saw {total_frames} frame(s) at frame skip {stride})")]
    EmptySample {
        /// Number of frames observed before the stream ended.
        total_frames: u64,
        /// Frame skip that was in effect.
        stride: u64,
    },

    /// A configured directory could not be scanned or prepared.
    #[error("Directory {path} is unusable: {reason}")]
    InvalidDirectory {
        /// The directory in question.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The output image extension is not one the `image` crate can encode.
    #[error("Unsupported image extension: {0}")]
    UnsupportedImageExtension(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding an output image.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for MeanFrameError {
    fn from(error: FfmpegError) -> Self {
        MeanFrameError::FfmpegError(error.to_string())
    }
}
