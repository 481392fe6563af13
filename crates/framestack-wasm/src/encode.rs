//! Image encoding WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { encode_image } from '@framestack/wasm';
//!
//! const out = encode_image(image, 'webp', 0.85);
//! const blob = new Blob([out.bytes()], { type: out.mimeType });
//! ```

use framestack_core::encode;
use framestack_core::ExportFormat;
use wasm_bindgen::prelude::*;

use crate::error::to_js_error;
use crate::types::{JsDecodedImage, JsStitchOutput};

/// Encode an RGBA image as `jpg`, `png` or `webp`.
///
/// `quality` (0.1 to 1.0) applies to jpg and webp; png ignores it. An
/// unknown format name falls back to jpg, as parameter validation does.
#[wasm_bindgen]
pub fn encode_image(
    image: &JsDecodedImage,
    format: &str,
    quality: f64,
) -> Result<JsStitchOutput, JsValue> {
    let format = ExportFormat::parse(format).unwrap_or_default();
    let canvas = image.clone().into_decoded().map_err(to_js_error)?;
    encode::encode(&canvas, format, quality)
        .map(|output| JsStitchOutput::from_output(output, None))
        .map_err(to_js_error)
}

/// Encode RGBA pixel data straight to JPEG bytes.
///
/// `quality` is 1-100.
#[wasm_bindgen]
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(pixels, width, height, quality).map_err(to_js_error)
}
