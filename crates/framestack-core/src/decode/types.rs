//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::ImageGeometry;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream is not a format we can decode.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The pixel buffer handed in by the caller does not match its dimensions.
    #[error("Pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    BufferMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded image with RGBA pixel data.
///
/// This is the descriptor the stitch engine works on: the geometry comes from
/// the buffer itself, so the dimensions can never disagree with the pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Bytes per pixel in every buffer this crate produces.
    pub const CHANNELS: usize = 4;

    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a DecodedImage, checking the buffer length instead of asserting.
    ///
    /// Used at the JavaScript boundary where the buffer comes from a canvas
    /// `ImageData` and may be anything.
    pub fn try_new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        if pixels.len() != width as usize * height as usize * Self::CHANNELS {
            return Err(DecodeError::BufferMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * Self::CHANNELS],
        }
    }

    /// Create a DecodedImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Geometry used by layout computation.
    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry::new(self.width, self.height)
    }

    /// Number of bytes in one row of pixels.
    pub fn row_stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    /// Borrow a run of whole rows.
    pub fn rows(&self, start: u32, count: u32) -> &[u8] {
        let stride = self.row_stride();
        let begin = start as usize * stride;
        &self.pixels[begin..begin + count as usize * stride]
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
