//! Internal utility functions.

use ffmpeg_next::frame::Video as VideoFrame;

/// Copy plane 0 of a scaled FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg rows are frequently padded (stride > width × bytes per pixel); the
/// padding is dropped so the result matches [`crate::Frame`]'s layout.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_len {
        data[..row_len * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_len * (height as usize));
        for row in data.chunks(stride).take(height as usize) {
            buffer.extend_from_slice(&row[..row_len]);
        }
        buffer
    }
}
