//! Sequential video decoding.
//!
//! [`VideoFile`] opens a container with FFmpeg, selects the best video stream
//! and caches its [`VideoMetadata`]. [`FrameIterator`] then decodes every
//! frame of that stream in order, converting each to a packed [`Frame`] in
//! the requested [`PixelFormat`]. Nothing is sought and nothing is buffered
//! beyond the frame being yielded.
//!
//! All FFmpeg handles (demuxer, decoder, scaler) are owned values: they are
//! released when the iterator and the file are dropped, whether iteration ran
//! to the end, stopped early, or failed.
//!
//! # Example
//!
//! ```no_run
//! use meanframe::{PixelFormat, VideoFile, compute_mean_image};
//!
//! let mut video = VideoFile::open("input/clip.mp4")?;
//! let mean = compute_mean_image(video.frames(PixelFormat::Rgb8)?, 9)?;
//! mean.image.save("clip@10.jpg")?;
//! # Ok::<(), meanframe::MeanFrameError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};

use crate::{
    configuration::PixelFormat,
    error::MeanFrameError,
    frame::{Frame, FrameShape},
    metadata::VideoMetadata,
};

/// Demux errors tolerated in a row before the stream is declared broken.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// An opened video file.
pub struct VideoFile {
    input_context: Input,
    video_stream_index: usize,
    metadata: VideoMetadata,
    file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the best
    /// video stream and reads its metadata.
    ///
    /// # Errors
    ///
    /// - [`MeanFrameError::FileOpen`] if the file cannot be opened or its
    ///   video codec cannot be set up.
    /// - [`MeanFrameError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MeanFrameError> {
        let file_path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| MeanFrameError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| MeanFrameError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(MeanFrameError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder = open_decoder(&input_context, video_stream_index).map_err(|error| {
            MeanFrameError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            }
        })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let frame_count = match stream.frames() {
            count if count > 0 => count as u64,
            _ if frames_per_second > 0.0 => (duration.as_secs_f64() * frames_per_second) as u64,
            _ => 0,
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            format: input_context.format().name().to_string(),
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{} @ {:.2} fps, ~{} frames [{}]",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            metadata,
            file_path,
        })
    }

    /// Cached metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Decode every frame from the current position to the end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder or the pixel converter cannot be set
    /// up. Per-frame errors are reported through the iterator.
    pub fn frames(&mut self, pixel_format: PixelFormat) -> Result<FrameIterator<'_>, MeanFrameError> {
        FrameIterator::new(self, pixel_format)
    }
}

fn open_decoder(input_context: &Input, stream_index: usize) -> Result<VideoDecoder, MeanFrameError> {
    let stream = input_context
        .stream(stream_index)
        .ok_or(MeanFrameError::NoVideoStream)?;
    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    Ok(decoder_context.decoder().video()?)
}

/// `true` for the receive results that only mean "send more packets" (or
/// "fully drained"), as opposed to a real decoding failure.
fn decoder_wants_input(error: &FfmpegError) -> bool {
    matches!(error, FfmpegError::Eof | FfmpegError::Other { errno: EAGAIN })
}

/// A lazy, forward-only iterator over every decoded frame of a video.
///
/// Frames are yielded in decoder output order. The iterator borrows the
/// [`VideoFile`] mutably; dropping it releases its decoder and scaler.
/// After the first error the iterator is fused and yields `None`.
pub struct FrameIterator<'a> {
    video: &'a mut VideoFile,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    shape: FrameShape,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    frames_yielded: u64,
    consecutive_read_errors: u32,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameIterator<'a> {
    fn new(video: &'a mut VideoFile, pixel_format: PixelFormat) -> Result<Self, MeanFrameError> {
        let decoder = open_decoder(&video.input_context, video.video_stream_index)?;
        let shape = video.metadata.frame_shape(pixel_format);
        if shape.width == 0 || shape.height == 0 {
            return Err(MeanFrameError::VideoDecodeError(format!(
                "decoder reports empty frame geometry {shape}"
            )));
        }

        let scaler = ScalingContext::get(
            decoder.format(),
            shape.width,
            shape.height,
            pixel_format.to_ffmpeg_pixel(),
            shape.width,
            shape.height,
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            video,
            decoder,
            scaler,
            shape,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            frames_yielded: 0,
            consecutive_read_errors: 0,
            eof_sent: false,
            done: false,
        })
    }

    /// Shape of every frame this iterator yields.
    pub fn frame_shape(&self) -> FrameShape {
        self.shape
    }

    /// Convert the current `decoded_frame` into a packed [`Frame`].
    fn convert_current_frame(&mut self) -> Result<Frame, MeanFrameError> {
        let (width, height) = (self.decoded_frame.width(), self.decoded_frame.height());
        if width != self.shape.width || height != self.shape.height {
            return Err(MeanFrameError::FrameShapeMismatch {
                expected: self.shape,
                found: FrameShape::new(height, width, self.shape.channels),
                frame_index: self.frames_yielded,
            });
        }

        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
        let buffer = crate::utilities::frame_to_buffer(
            &self.scaled_frame,
            self.shape.width,
            self.shape.height,
            self.shape.channels as usize,
        );
        Frame::from_raw(self.shape, buffer)
    }

    fn fail(&mut self, error: MeanFrameError) -> Option<Result<Frame, MeanFrameError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for FrameIterator<'_> {
    type Item = Result<Frame, MeanFrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {
                    return match self.convert_current_frame() {
                        Ok(frame) => {
                            self.frames_yielded += 1;
                            Some(Ok(frame))
                        }
                        Err(error) => self.fail(error),
                    };
                }
                Err(error) if decoder_wants_input(&error) => {}
                Err(error) => {
                    return self.fail(MeanFrameError::VideoDecodeError(format!(
                        "frame {}: {error}",
                        self.frames_yielded
                    )));
                }
            }

            if self.eof_sent {
                log::debug!(
                    "End of stream after {} frame(s) in {}",
                    self.frames_yielded,
                    self.video.file_path.display()
                );
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.video.input_context) {
                Ok(()) => {
                    self.consecutive_read_errors = 0;
                    if packet.stream() == self.video.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            return self.fail(MeanFrameError::VideoDecodeError(format!(
                                "frame {}: {error}",
                                self.frames_yielded
                            )));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        return self.fail(MeanFrameError::from(error));
                    }
                    self.eof_sent = true;
                }
                Err(error) if self.consecutive_read_errors >= MAX_CONSECUTIVE_READ_ERRORS => {
                    return self.fail(MeanFrameError::VideoDecodeError(format!(
                        "giving up after {} unreadable packets: {error}",
                        self.consecutive_read_errors + 1
                    )));
                }
                Err(error) => {
                    self.consecutive_read_errors += 1;
                    log::warn!(
                        "Skipping unreadable packet in {}: {error}",
                        self.video.file_path.display()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::{Error as FfmpegError, util::error::EAGAIN};

    use super::decoder_wants_input;

    #[test]
    fn again_and_end_of_stream_ask_for_input() {
        assert!(decoder_wants_input(&FfmpegError::Other { errno: EAGAIN }));
        assert!(decoder_wants_input(&FfmpegError::Eof));
    }

    #[test]
    fn real_decode_failures_are_not_swallowed() {
        assert!(!decoder_wants_input(&FfmpegError::InvalidData));
        assert!(!decoder_wants_input(&FfmpegError::Bug));
    }
}
