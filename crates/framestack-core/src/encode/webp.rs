//! WebP encoding with a quality knob.
//!
//! The pure-Rust WebP encoder only writes lossless streams, and C bindings
//! to libwebp do not build for `wasm32-unknown-unknown`. Lossy behaviour is
//! approximated by clearing low bits of the color channels before the
//! lossless pass. Lower quality clears more bits.
//!
//! Clearing bits does not always shrink the stream (smooth gradients are
//! already cheap for the lossless predictors), so every coarser-or-equal
//! setting down to lossless is tried and the smallest stream wins. Output
//! size therefore never grows as quality drops and never exceeds the
//! lossless encoding.

use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;

use super::{check_buffer, EncodeError};

/// Most low bits cleared per channel, at quality 1.
const MAX_DROPPED_BITS: u32 = 6;

/// Encode RGBA pixel data to WebP bytes.
///
/// `quality` is 1-100; 100 is lossless. Alpha is never quantized.
pub fn encode_webp(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height)?;

    let mut best = encode_lossless(pixels, width, height)?;
    let mut quantized = Vec::new();

    for bits in 1..=dropped_bits(quality) {
        quantized.clear();
        quantized.extend_from_slice(pixels);
        quantize_rgb(&mut quantized, bits);

        let candidate = encode_lossless(&quantized, width, height)?;
        if candidate.len() < best.len() {
            best = candidate;
        }
    }

    Ok(best)
}

fn encode_lossless(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer)
        .encode(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "webp",
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Clear the lowest `bits` bits of every color channel.
fn quantize_rgb(data: &mut [u8], bits: u32) {
    let mask = !((1u16 << bits) - 1) as u8;
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            *channel &= mask;
        }
    }
}

/// Low bits cleared at `quality`: 0 at 100, rising to [`MAX_DROPPED_BITS`].
fn dropped_bits(quality: u8) -> u32 {
    let loss = u32::from(100 - quality.clamp(1, 100));
    (loss * MAX_DROPPED_BITS).div_ceil(100).min(MAX_DROPPED_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[
                    (x * 255 / width) as u8,
                    (y * 255 / height) as u8,
                    ((x + y) * 127 / (width + height)) as u8,
                    255,
                ]);
            }
        }
        pixels
    }

    /// Deterministic pseudo-random pixels (xorshift).
    fn noise(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
        pixels
    }

    #[test]
    fn test_webp_container_header() {
        let webp = encode_webp(&gradient(8, 8), 8, 8, 80).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_full_quality_is_lossless() {
        let pixels = gradient(16, 9);
        let webp = encode_webp(&pixels, 16, 9, 100).unwrap();
        let decoded = image::load_from_memory(&webp).unwrap().into_rgba8();
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_low_quality_is_smaller_on_detailed_images() {
        let pixels = noise(64, 64);
        let low = encode_webp(&pixels, 64, 64, 10).unwrap();
        let high = encode_webp(&pixels, 64, 64, 100).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_size_never_grows_as_quality_drops() {
        for (pixels, side) in [(gradient(64, 64), 64), (noise(48, 48), 48)] {
            let lossless = encode_webp(&pixels, side, side, 100).unwrap().len();
            let mut previous = lossless;
            for quality in [92, 70, 50, 30, 10, 1] {
                let size = encode_webp(&pixels, side, side, quality).unwrap().len();
                assert!(size <= previous, "q{quality}: {size} > {previous}");
                assert!(size <= lossless);
                previous = size;
            }
        }
    }

    #[test]
    fn test_lossy_error_is_bounded() {
        let pixels = noise(16, 16);
        let webp = encode_webp(&pixels, 16, 16, 50).unwrap();
        let decoded = image::load_from_memory(&webp).unwrap().into_rgba8().into_raw();

        let limit = (1u8 << dropped_bits(50)) - 1;
        for (a, b) in pixels.iter().zip(&decoded) {
            assert!(a.abs_diff(*b) <= limit);
        }
    }

    #[test]
    fn test_quantize_keeps_alpha() {
        let mut data = vec![100, 150, 201, 77];
        quantize_rgb(&mut data, MAX_DROPPED_BITS);
        assert_eq!(data, vec![64, 128, 192, 77]);
    }

    #[test]
    fn test_dropped_bits() {
        assert_eq!(dropped_bits(100), 0);
        assert_eq!(dropped_bits(92), 1);
        assert_eq!(dropped_bits(1), MAX_DROPPED_BITS);
        assert!(dropped_bits(50) < dropped_bits(10));
    }
}
