//! Decoded frame buffers.
//!
//! A [`Frame`] is a tightly-packed, row-major block of 8-bit samples with a
//! fixed `(height, width, channels)` [`FrameShape`]. Sample `(y, x, c)` lives
//! at `data[(y * width + x) * channels + c]`, top-left origin. Frames convert
//! to and from [`image::DynamicImage`] so the mean image can be encoded with
//! any format the `image` crate supports.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::MeanFrameError;

/// Geometry of a frame: height, width and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameShape {
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
    /// Samples per pixel (1 = gray, 3 = RGB, 4 = RGBA).
    pub channels: u8,
}

impl FrameShape {
    /// Create a shape from its three dimensions.
    pub fn new(height: u32, width: u32, channels: u8) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total number of samples (`height × width × channels`).
    pub fn sample_len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }
}

impl Display for FrameShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// One decoded raster image from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    shape: FrameShape,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MeanFrameError::InvalidFrame`] if the buffer length does not
    /// match the shape, the shape has no pixels, or the channel count is not
    /// 1, 3 or 4.
    pub fn from_raw(shape: FrameShape, data: Vec<u8>) -> Result<Self, MeanFrameError> {
        if shape.height == 0 || shape.width == 0 {
            return Err(MeanFrameError::InvalidFrame(format!("empty frame geometry {shape}")));
        }
        if !matches!(shape.channels, 1 | 3 | 4) {
            return Err(MeanFrameError::InvalidFrame(format!(
                "unsupported channel count {}",
                shape.channels
            )));
        }
        if data.len() != shape.sample_len() {
            return Err(MeanFrameError::InvalidFrame(format!(
                "buffer holds {} samples, shape {shape} needs {}",
                data.len(),
                shape.sample_len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// A frame with every sample set to `value`.
    pub fn filled(shape: FrameShape, value: u8) -> Result<Self, MeanFrameError> {
        Self::from_raw(shape, vec![value; shape.sample_len()])
    }

    /// The frame geometry.
    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Packed samples in raster order.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its sample buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Sample at row `y`, column `x`, channel `c`, if in bounds.
    pub fn sample(&self, y: u32, x: u32, c: u8) -> Option<u8> {
        let shape = self.shape;
        if y >= shape.height || x >= shape.width || c >= shape.channels {
            return None;
        }
        let index = (y as usize * shape.width as usize + x as usize) * shape.channels as usize
            + c as usize;
        self.data.get(index).copied()
    }

    /// Convert a decoded image into a frame.
    ///
    /// Gray, RGB and RGBA 8-bit images keep their layout. Anything else is
    /// converted to RGB8. Fails with [`MeanFrameError::InvalidFrame`] for an
    /// image without pixels.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self, MeanFrameError> {
        let (shape, data) = match image {
            DynamicImage::ImageLuma8(gray) => (
                FrameShape::new(gray.height(), gray.width(), 1),
                gray.as_raw().clone(),
            ),
            DynamicImage::ImageRgba8(rgba) => (
                FrameShape::new(rgba.height(), rgba.width(), 4),
                rgba.as_raw().clone(),
            ),
            other => {
                let rgb = other.to_rgb8();
                (FrameShape::new(rgb.height(), rgb.width(), 3), rgb.into_raw())
            }
        };
        Self::from_raw(shape, data)
    }

    /// Convert the frame into an [`image::DynamicImage`].
    pub fn to_dynamic_image(&self) -> Result<DynamicImage, MeanFrameError> {
        let FrameShape {
            height,
            width,
            channels,
        } = self.shape;
        let buffer = self.data.clone();
        let image = match channels {
            1 => GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or_else(|| {
            MeanFrameError::InvalidFrame(format!("cannot build an image of shape {}", self.shape))
        })
    }

    /// Encode the frame to `path`; the format follows the file extension.
    ///
    /// RGBA frames are flattened to RGB when the target format (JPEG) has no
    /// alpha channel.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MeanFrameError> {
        let path = path.as_ref();
        let image = self.to_dynamic_image()?;
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"));
        if is_jpeg && self.shape.channels == 4 {
            DynamicImage::ImageRgb8(image.to_rgb8()).save(path)?;
        } else {
            image.save(path)?;
        }
        Ok(())
    }
}
