//! Temporal mean accumulation.
//!
//! [`MeanImageAccumulator`] folds a forward-only sequence of frames into a
//! wide-integer running sum, sampling one frame in every `stride + 1`, and
//! [`MeanImageAccumulator::finish`] divides by the sample count to produce a
//! [`MeanImage`]. [`compute_mean_image`] is the one-call form over any
//! iterator of decoded frames.
//!
//! # Example
//!
//! ```
//! use meanframe::{Frame, FrameShape, compute_mean_image};
//!
//! let shape = FrameShape::new(1, 1, 1);
//! let frames = [10, 20, 30, 40, 50]
//!     .into_iter()
//!     .map(|value| Frame::filled(shape, value));
//!
//! let mean = compute_mean_image(frames, 1)?;
//! assert_eq!(mean.sample_count, 3);
//! assert_eq!(mean.image.as_raw(), &[30]);
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```

use crate::{
    error::MeanFrameError,
    frame::{Frame, FrameShape},
};

/// Returns `true` if the frame at `frame_index` is sampled at `stride`.
///
/// Stride `S` samples indices `0, S+1, 2(S+1), ...`.
pub fn is_sampled(frame_index: u64, stride: u64) -> bool {
    match stride.checked_add(1) {
        Some(period) => frame_index % period == 0,
        // A period of 2^64 only ever reaches index 0.
        None => frame_index == 0,
    }
}

/// Number of frames sampled from a video of `total_frames` frames:
/// `ceil(total_frames / (stride + 1))`.
pub fn expected_sample_count(total_frames: u64, stride: u64) -> u64 {
    match stride.checked_add(1) {
        Some(period) => total_frames.div_ceil(period),
        None => total_frames.min(1),
    }
}

/// The averaged image together with the counts it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct MeanImage {
    /// Per-sample mean, same shape as the input frames.
    pub image: Frame,
    /// Frames observed in the stream, sampled or not.
    pub total_frames: u64,
    /// Frames that contributed to the mean.
    pub sample_count: u64,
}

/// Running sum of sampled frames.
///
/// The accumulator is created empty, fixes its shape on the first frame (or
/// up front via [`with_shape`](MeanImageAccumulator::with_shape)), and is
/// consumed by [`finish`](MeanImageAccumulator::finish).
#[derive(Debug, Clone)]
pub struct MeanImageAccumulator {
    stride: u64,
    shape: Option<FrameShape>,
    sums: Vec<u64>,
    frames_seen: u64,
    samples_taken: u64,
}

impl MeanImageAccumulator {
    /// Create an accumulator that learns its shape from the first frame.
    pub fn new(stride: u64) -> Self {
        Self {
            stride,
            shape: None,
            sums: Vec::new(),
            frames_seen: 0,
            samples_taken: 0,
        }
    }

    /// Create an accumulator with a shape known ahead of time, typically the
    /// dimensions the decoder reports. Every frame is validated against it.
    pub fn with_shape(stride: u64, shape: FrameShape) -> Self {
        Self {
            stride,
            shape: Some(shape),
            sums: vec![0; shape.sample_len()],
            frames_seen: 0,
            samples_taken: 0,
        }
    }

    /// The frame skip in effect.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// The fixed frame shape, once known.
    pub fn shape(&self) -> Option<FrameShape> {
        self.shape
    }

    /// Frames pushed so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Frames added into the sum so far.
    pub fn samples_taken(&self) -> u64 {
        self.samples_taken
    }

    /// Feed the next frame in stream order.
    ///
    /// Returns `true` if the frame was sampled into the sum.
    ///
    /// # Errors
    ///
    /// [`MeanFrameError::FrameShapeMismatch`] if the frame's shape differs
    /// from the accumulator's. The accumulator is left unchanged.
    pub fn push(&mut self, frame: &Frame) -> Result<bool, MeanFrameError> {
        let found = frame.shape();
        match self.shape {
            Some(expected) if expected != found => {
                return Err(MeanFrameError::FrameShapeMismatch {
                    expected,
                    found,
                    frame_index: self.frames_seen,
                });
            }
            Some(_) => {}
            None => {
                log::debug!("Accumulator shape fixed at {found}");
                self.shape = Some(found);
                self.sums = vec![0; found.sample_len()];
            }
        }

        let sampled = is_sampled(self.frames_seen, self.stride);
        if sampled {
            for (sum, &sample) in self.sums.iter_mut().zip(frame.as_raw()) {
                *sum += u64::from(sample);
            }
            self.samples_taken += 1;
        }
        self.frames_seen += 1;
        Ok(sampled)
    }

    /// Divide the sums by the sample count and produce the mean image.
    ///
    /// Each sample is rounded half-to-even and clamped to `0..=255`.
    ///
    /// # Errors
    ///
    /// [`MeanFrameError::EmptySample`] if no frame was sampled.
    pub fn finish(self) -> Result<MeanImage, MeanFrameError> {
        let (shape, count) = match self.shape {
            Some(shape) if self.samples_taken > 0 => (shape, self.samples_taken),
            _ => {
                return Err(MeanFrameError::EmptySample {
                    total_frames: self.frames_seen,
                    stride: self.stride,
                });
            }
        };

        let data = self
            .sums
            .iter()
            .map(|&sum| divide_round_half_even(sum, count).min(255) as u8)
            .collect();

        Ok(MeanImage {
            image: Frame::from_raw(shape, data)?,
            total_frames: self.frames_seen,
            sample_count: count,
        })
    }
}

/// Integer `numerator / denominator`, ties rounded to the even quotient.
fn divide_round_half_even(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    // Compare 2r with d without overflowing.
    let half_up = denominator - remainder;
    if remainder > half_up || (remainder == half_up && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

/// Compute the temporal mean of a frame stream.
///
/// Frames are consumed strictly in order; the frame at zero-based index `i`
/// contributes iff `i % (stride + 1) == 0`. The stream is never sought and
/// ends at exhaustion.
///
/// A stream whose first item is an error is reported as
/// [`MeanFrameError::EmptySample`] with `total_frames = 0`; errors after at
/// least one frame are returned unchanged.
pub fn compute_mean_image<I>(frames: I, stride: u64) -> Result<MeanImage, MeanFrameError>
where
    I: IntoIterator<Item = Result<Frame, MeanFrameError>>,
{
    compute_mean_image_with(MeanImageAccumulator::new(stride), frames, |_, _, _| Ok(()))
}

/// [`compute_mean_image`] with a pre-built accumulator and an observer.
///
/// `inspect` is called after each frame is folded in, with the frame's
/// zero-based index, the frame, and whether it was sampled. An error from
/// `inspect` stops the fold and is returned.
pub fn compute_mean_image_with<I, F>(
    mut accumulator: MeanImageAccumulator,
    frames: I,
    mut inspect: F,
) -> Result<MeanImage, MeanFrameError>
where
    I: IntoIterator<Item = Result<Frame, MeanFrameError>>,
    F: FnMut(u64, &Frame, bool) -> Result<(), MeanFrameError>,
{
    for frame in frames {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) if accumulator.frames_seen() == 0 => {
                log::warn!("Decoding failed before the first frame: {error}");
                return Err(MeanFrameError::EmptySample {
                    total_frames: 0,
                    stride: accumulator.stride(),
                });
            }
            Err(error) => return Err(error),
        };
        let frame_index = accumulator.frames_seen();
        let sampled = accumulator.push(&frame)?;
        inspect(frame_index, &frame, sampled)?;
    }
    accumulator.finish()
}
