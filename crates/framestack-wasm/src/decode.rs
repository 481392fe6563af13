//! Image decoding WASM bindings.
//!
//! The plugin normally lets the browser decode images through `<img>`; these
//! bindings cover hosts that hand over raw file bytes instead.
//!
//! # Example
//!
//! ```typescript
//! import { decode_image } from '@framestack/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(`Decoded ${image.width}x${image.height}`);
//! ```

use framestack_core::decode;
use wasm_bindgen::prelude::*;

use crate::error::to_js_error;
use crate::types::JsDecodedImage;

/// Decode JPEG, PNG, WebP, BMP or GIF bytes to RGBA.
///
/// JPEG EXIF orientation is applied, so the result is upright.
///
/// # Errors
///
/// Throws an `Error` with `kind: "decode"` if the bytes are not a supported
/// image or are corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(to_js_error)
}

/// EXIF orientation (1-8) of JPEG bytes; 1 when absent.
#[wasm_bindgen]
pub fn get_orientation(bytes: &[u8]) -> u8 {
    decode::get_orientation(bytes) as u8
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_empty_fails() {
        assert!(decode_image(&[]).is_err());
    }
}
