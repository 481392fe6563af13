//! Image decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use image::ImageReader;

use super::{DecodeError, DecodedImage, Orientation};

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// The format is guessed from the leading bytes (JPEG, PNG, WebP, BMP and GIF
/// are compiled in). The result is always RGBA so that composition can leave
/// uncovered canvas areas transparent.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognised.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Extract EXIF orientation value from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    fn png_bytes(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(rgba, width, height, ExtendedColorType::Rgba8)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_png_keeps_alpha() {
        let pixels = [255, 0, 0, 255, 0, 0, 255, 128];
        let bytes = png_bytes(2, 1, &pixels);

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.pixels, pixels.to_vec());
    }

    #[test]
    fn test_decode_rgb_png_gets_opaque_alpha() {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(&[10, 20, 30], 1, 1, ExtendedColorType::Rgb8)
            .unwrap();

        let img = decode_image(&buffer).unwrap();
        assert_eq!(img.pixels, vec![10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes(4, 4, &[200u8; 4 * 4 * 4]);
        let result = decode_image(&bytes[..20]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_extraction_no_exif() {
        let bytes = png_bytes(1, 1, &[0, 0, 0, 255]);
        assert_eq!(get_orientation(&bytes), Orientation::Normal);
    }

    #[test]
    fn test_orientation_extraction_invalid_data() {
        assert_eq!(get_orientation(&[0x00, 0x01, 0x02]), Orientation::Normal);
    }

    fn two_pixel_strip() -> DynamicImage {
        let pixels = vec![
            255, 0, 0, 255, // Red (left)
            0, 255, 0, 255, // Green (right)
        ];
        DynamicImage::ImageRgba8(image::RgbaImage::from_raw(2, 1, pixels).unwrap())
    }

    #[test]
    fn test_apply_orientation_normal() {
        let result = apply_orientation(two_pixel_strip(), Orientation::Normal).into_rgba8();
        assert_eq!(result.dimensions(), (2, 1));
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_rotate90() {
        let result = apply_orientation(two_pixel_strip(), Orientation::Rotate90CW).into_rgba8();
        assert_eq!(result.dimensions(), (1, 2));
    }

    #[test]
    fn test_apply_orientation_rotate180() {
        let result = apply_orientation(two_pixel_strip(), Orientation::Rotate180).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let result =
            apply_orientation(two_pixel_strip(), Orientation::FlipHorizontal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
