//! Lossless PNG encoding.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use super::{check_buffer, EncodeError};

/// Encode RGBA pixel data to PNG bytes, alpha included.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "png",
            message: e.to_string(),
        })?;

    Ok(buffer)
}
