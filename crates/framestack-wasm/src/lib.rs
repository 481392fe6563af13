//! Framestack WASM - WebAssembly bindings for the stitching engine
//!
//! This crate exposes framestack-core to the JavaScript plugin runtime. The
//! host application, DOM, toasts and translations stay in JavaScript; this
//! side validates parameters, lays out, composes and encodes.
//!
//! # Module Structure
//!
//! - `params` - Parameter validation with user-facing notices
//! - `stitch` - One-shot stitching and the interactive `JsStitchSession`
//! - `storage` - Settings persisted in `localStorage`
//! - `selection` - Selection change tracking and sanity checks
//! - `decode` / `encode` - Raw image bytes in and out
//! - `types` - WASM-compatible wrapper types for image data
//!
//! Every thrown error is a JS `Error` with a `kind` tag; see `error`.
//!
//! # Usage
//!
//! ```typescript
//! import init, { stitch_images, JsDecodedImage } from '@framestack/wasm';
//!
//! await init();
//!
//! const images = frames.map((c) => {
//!   const data = c.getContext('2d').getImageData(0, 0, c.width, c.height).data;
//!   return new JsDecodedImage(c.width, c.height, data);
//! });
//! const params = { cropTopPercent: 80, cropBottomPercent: 5, exportFormat: 'webp' };
//! const out = stitch_images(images, params);
//! const blob = new Blob([out.bytes()], { type: out.mimeType });
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod error;
mod logger;
mod params;
mod selection;
mod stitch;
mod storage;
mod types;

// Re-export public types
pub use decode::{decode_image, get_orientation};
pub use encode::{encode_image, encode_jpeg};
pub use params::{default_parameters, validate_parameters};
pub use selection::{selection_key, validate_selection, JsSelectionTracker};
pub use stitch::{compute_layout, stitch_images, JsStitchSession, JsStitchTicket};
pub use storage::{JsParameterStore, LocalStorage};
pub use types::{JsDecodedImage, JsStitchOutput};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
    log::debug!("framestack {} ready", framestack_core::version());
}

/// Change how chatty the console logger is (`error`, `warn`, `info`,
/// `debug`, `trace` or `off`). Returns `false` for an unknown level.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match logger::parse_level(level) {
        Some(filter) => {
            log::set_max_level(filter);
            true
        }
        None => false,
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    framestack_core::version().to_string()
}

/// Default export file name for `format` at the current time.
#[wasm_bindgen]
pub fn suggested_filename(format: &str) -> String {
    let format = framestack_core::ExportFormat::parse(format).unwrap_or_default();
    framestack_core::export::suggested_filename(format, chrono::Utc::now())
}

/// File-system-safe version of a user supplied name.
#[wasm_bindgen]
pub fn safe_filename(name: &str) -> String {
    framestack_core::export::safe_filename(name)
}
