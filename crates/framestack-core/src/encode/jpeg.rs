//! JPEG encoding for export.
//!
//! JPEG has no alpha channel. Transparent canvas areas are flattened onto
//! black, which is what a 2D canvas produces when exported as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{check_buffer, EncodeError};

/// Encode RGBA pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Example
///
/// ```
/// use framestack_core::encode::encode_jpeg;
///
/// let pixels = vec![128u8; 100 * 100 * 4]; // Gray image
/// let jpeg = encode_jpeg(&pixels, 100, 100, 90).unwrap();
///
/// // Verify JPEG magic bytes
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height)?;

    let rgb = flatten_onto_black(pixels);
    let quality = quality.clamp(1, 100);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "jpg",
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}

/// Drop the alpha channel, pre-multiplying color onto a black background.
fn flatten_onto_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let alpha = u16::from(px[3]);
        for &channel in &px[..3] {
            rgb.push(((u16::from(channel) * alpha + 127) / 255) as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================
