//! Image encoding for export.
//!
//! This module provides functionality for:
//! - Encoding the stitched canvas to JPEG, PNG or WebP
//! - Mapping the 0.1-1.0 export quality onto encoder settings
//! - Tagging the result with its MIME type for the save/display side
//!
//! All operations are synchronous and single-threaded.
//!
//! # Examples
//!
//! ```ignore
//! use framestack_core::encode::encode;
//! use framestack_core::ExportFormat;
//!
//! let output = encode(&canvas, ExportFormat::Webp, 0.8).unwrap();
//! println!("{} bytes of {}", output.bytes.len(), output.mime_type);
//! ```

mod jpeg;
mod png;
mod webp;

pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use webp::encode_webp;

use serde::Serialize;
use thiserror::Error;

use crate::decode::DecodedImage;
use crate::params::{ExportFormat, MAX_EXPORT_QUALITY, MIN_EXPORT_QUALITY};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

pub(crate) fn check_buffer(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * DecodedImage::CHANNELS;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// An encoded stitch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchOutput {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// MIME type matching `bytes`, e.g. `image/jpeg`.
    pub mime_type: &'static str,
    /// Format used.
    pub format: ExportFormat,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// Map export quality (0.1 to 1.0) to the 1-100 scale encoders use.
pub fn quality_percent(quality: f64) -> u8 {
    let quality = if quality.is_finite() {
        quality.clamp(MIN_EXPORT_QUALITY, MAX_EXPORT_QUALITY)
    } else {
        crate::params::DEFAULT_EXPORT_QUALITY
    };
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode a canvas in the requested format.
///
/// `quality` applies to JPEG and WebP; PNG is always lossless and ignores it.
pub fn encode(
    canvas: &DecodedImage,
    format: ExportFormat,
    quality: f64,
) -> Result<StitchOutput, EncodeError> {
    let (width, height) = (canvas.width, canvas.height);

    let bytes = match format {
        ExportFormat::Jpg => encode_jpeg(&canvas.pixels, width, height, quality_percent(quality))?,
        ExportFormat::Webp => encode_webp(&canvas.pixels, width, height, quality_percent(quality))?,
        ExportFormat::Png => encode_png(&canvas.pixels, width, height)?,
    };

    log::debug!(
        "encoded {}x{} {} at quality {:.2}: {} bytes",
        width,
        height,
        format,
        quality,
        bytes.len()
    );

    Ok(StitchOutput {
        bytes,
        mime_type: format.mime_type(),
        format,
        width,
        height,
    })
}
