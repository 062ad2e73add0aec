//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and cached for its lifetime.

use std::time::Duration;

use crate::{configuration::PixelFormat, frame::FrameShape};

/// Metadata for the selected video stream.
///
/// # Example
///
/// ```no_run
/// use meanframe::VideoFile;
///
/// let video = VideoFile::open("input/clip.mp4")?;
/// let metadata = video.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// # Ok::<(), meanframe::MeanFrameError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels, as reported by the decoder.
    pub width: u32,
    /// Frame height in pixels, as reported by the decoder.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated frame count: the stream's own count when the container
    /// records one, otherwise duration × frame rate.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Shape decoded frames will have once converted to `pixel_format`.
    pub fn frame_shape(&self, pixel_format: PixelFormat) -> FrameShape {
        FrameShape::new(self.height, self.width, pixel_format.channels())
    }
}
