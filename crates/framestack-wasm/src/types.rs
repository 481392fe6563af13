//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core framestack
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use framestack_core::decode::{DecodeError, DecodedImage};
use framestack_core::encode::StitchOutput;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A decoded image wrapper for JavaScript.
///
/// Pixels are RGBA, the layout of `ImageData.data`, so a canvas can take them
/// with `new ImageData(new Uint8ClampedArray(img.pixels()), img.width)`.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
///
/// The `free()` method can be called to explicitly release WASM memory, but this is
/// optional as wasm-bindgen's finalizer will handle cleanup automatically.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Wrap RGBA pixel data, e.g. from `ctx.getImageData(...).data`.
    ///
    /// The buffer length is checked when the image is used, not here.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Move into a core image, checking the buffer length.
    pub(crate) fn into_decoded(self) -> Result<DecodedImage, DecodeError> {
        DecodedImage::try_new(self.width, self.height, self.pixels)
    }
}

/// An encoded image handed back to JavaScript.
#[wasm_bindgen]
pub struct JsStitchOutput {
    bytes: Vec<u8>,
    mime_type: String,
    format: String,
    width: u32,
    height: u32,
    filename: Option<String>,
}

#[wasm_bindgen]
impl JsStitchOutput {
    /// Encoded file contents as Uint8Array (a copy).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.format.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Suggested file name; only set for session exports.
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> Option<String> {
        self.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

impl JsStitchOutput {
    pub(crate) fn from_output(output: StitchOutput, filename: Option<String>) -> Self {
        Self {
            bytes: output.bytes,
            mime_type: output.mime_type.to_string(),
            format: output.format.as_str().to_string(),
            width: output.width,
            height: output.height,
            filename,
        }
    }
}

/// A correction or issue with the human-readable text next to its fields,
/// e.g. `{ kind: "cropLimited", field: "cropTop", value: 49, other: 50, message: "..." }`.
#[derive(Debug, Serialize)]
pub(crate) struct JsNotice<T: Serialize> {
    #[serde(flatten)]
    pub detail: T,
    pub message: String,
}

impl<T: Serialize + std::fmt::Display> JsNotice<T> {
    pub(crate) fn new(detail: T) -> Self {
        let message = detail.to_string();
        Self { detail, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_core::{AdjustingField, Adjustment, ExportFormat};

    #[test]
    fn test_js_decoded_image_creation() {
        let img = JsDecodedImage::new(100, 50, vec![0u8; 100 * 50 * 4]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 20000);
    }

    #[test]
    fn test_round_trip_through_core() {
        let decoded = DecodedImage::new(3, 2, vec![7u8; 3 * 2 * 4]);
        let js_img = JsDecodedImage::from_decoded(decoded.clone());
        assert_eq!(js_img.pixels().len(), 24);
        assert_eq!(js_img.into_decoded().unwrap(), decoded);
    }

    #[test]
    fn test_into_decoded_rejects_rgb_buffer() {
        let js_img = JsDecodedImage::new(10, 10, vec![0u8; 10 * 10 * 3]);
        assert!(matches!(
            js_img.into_decoded(),
            Err(DecodeError::BufferMismatch { .. })
        ));
    }

    #[test]
    fn test_output_wrapper() {
        let output = StitchOutput {
            bytes: vec![1, 2, 3, 4],
            mime_type: "image/webp",
            format: ExportFormat::Webp,
            width: 20,
            height: 30,
        };
        let js = JsStitchOutput::from_output(output, Some("a.webp".to_string()));
        assert_eq!(js.mime_type(), "image/webp");
        assert_eq!(js.format(), "webp");
        assert_eq!(js.byte_length(), 4);
        assert_eq!(js.filename().as_deref(), Some("a.webp"));
    }

    #[test]
    fn test_notice_flattens_detail() {
        let notice = JsNotice::new(Adjustment::CropLimited {
            field: AdjustingField::CropBottom,
            value: 39.0,
            other: 60.0,
        });
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "cropLimited");
        assert_eq!(json["field"], "cropBottom");
        assert_eq!(json["value"], 39.0);
        assert_eq!(
            json["message"],
            "Bottom crop adjusted to maximum setting: 39% (top fixed at 60%)"
        );
    }
}
