//! Stitching bindings: one-shot functions and the interactive session.
//!
//! # Example
//!
//! ```typescript
//! import { JsStitchSession, JsDecodedImage } from '@framestack/wasm';
//!
//! const session = new JsStitchSession(store.load().params);
//! const ticket = session.begin();            // throws { kind: "busy" } if running
//! try {
//!   const key = ids.join(',');
//!   if (session.has_cached(key)) {
//!     session.render_cached_preview(ticket);
//!   } else {
//!     session.render_preview(ticket, images, key);
//!   }
//!   const preview = session.preview_image();
//!   ctx.putImageData(new ImageData(new Uint8ClampedArray(preview.pixels()), preview.width), 0, 0);
//! } finally {
//!   session.finish(ticket);
//! }
//!
//! const out = session.export();
//! await eagle.item.addFromPath(writeTemp(out.filename, out.bytes()));
//! ```

use framestack_core::decode::DecodedImage;
use framestack_core::layout::{self, ImageGeometry};
use framestack_core::session::StitchTicket;
use framestack_core::{stitch, AdjustingField, StitchSession};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::to_js_error;
use crate::params::{params_from_js, raw_from_js, to_js};
use crate::types::{JsDecodedImage, JsNotice, JsStitchOutput};

fn into_core_images(images: Vec<JsDecodedImage>) -> Result<Vec<DecodedImage>, JsValue> {
    images
        .into_iter()
        .map(|image| image.into_decoded().map_err(to_js_error))
        .collect()
}

/// Compute the stitch layout for a list of `{ width, height }` objects.
///
/// Returns `{ canvasWidth, canvasHeight, blits: [{ descriptorIndex, srcY, srcHeight, destY }] }`.
#[wasm_bindgen]
pub fn compute_layout(geometries: JsValue, params: JsValue) -> Result<JsValue, JsValue> {
    let geometries: Vec<ImageGeometry> =
        serde_wasm_bindgen::from_value(geometries).map_err(to_js_error)?;
    let params = params_from_js(params)?;
    let layout = layout::compute_layout(&geometries, &params).map_err(to_js_error)?;
    to_js(&layout)
}

/// Crop, stack and encode the images in one call.
///
/// The images are consumed.
#[wasm_bindgen]
pub fn stitch_images(
    images: Vec<JsDecodedImage>,
    params: JsValue,
) -> Result<JsStitchOutput, JsValue> {
    let params = params_from_js(params)?;
    let images = into_core_images(images)?;
    stitch(&images, &params)
        .map(|output| JsStitchOutput::from_output(output, None))
        .map_err(to_js_error)
}

/// Handle for the running stitch. Pass it back to `finish`.
#[wasm_bindgen]
pub struct JsStitchTicket {
    inner: StitchTicket,
}

/// Preview summary returned from the render calls.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsPreviewInfo {
    width: u32,
    height: u32,
    contributing_images: usize,
}

/// Interactive stitching state for one plugin window.
#[wasm_bindgen]
pub struct JsStitchSession {
    inner: StitchSession,
}

#[wasm_bindgen]
impl JsStitchSession {
    /// Start a session; `params` is validated first and may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(params: JsValue) -> Result<JsStitchSession, JsValue> {
        Ok(Self {
            inner: StitchSession::new(params_from_js(params)?),
        })
    }

    /// Current parameters as a plain object.
    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.parameters())
    }

    /// Merge and validate raw values; returns the notices.
    pub fn update_parameters(
        &mut self,
        raw: JsValue,
        adjusting: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let raw = raw_from_js(raw)?;
        let field = adjusting.as_deref().and_then(AdjustingField::parse);
        let notices: Vec<_> = self
            .inner
            .update_parameters(&raw, field)
            .into_iter()
            .map(JsNotice::new)
            .collect();
        to_js(&notices)
    }

    /// Claim the stitch slot. Throws `kind: "busy"` while one is running.
    pub fn begin(&mut self) -> Result<JsStitchTicket, JsValue> {
        self.inner
            .begin()
            .map(|inner| JsStitchTicket { inner })
            .map_err(to_js_error)
    }

    /// Release the stitch slot.
    pub fn finish(&mut self, ticket: JsStitchTicket) -> Result<(), JsValue> {
        self.inner.finish(ticket.inner).map_err(to_js_error)
    }

    /// Invalidate the running stitch, e.g. when the selection changed.
    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.inner.is_busy()
    }

    /// Compose `images` into the preview. With `cache_key`, the decoded
    /// images are kept for later crop-only changes.
    pub fn render_preview(
        &mut self,
        ticket: &JsStitchTicket,
        images: Vec<JsDecodedImage>,
        cache_key: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let images = into_core_images(images)?;
        let info = match cache_key {
            Some(key) => self.inner.render_and_cache(&ticket.inner, key, images),
            None => self.inner.render_preview(&ticket.inner, &images),
        }
        .map(preview_info)
        .map_err(to_js_error)?;
        to_js(&info)
    }

    /// Re-compose the cached images with the current parameters.
    pub fn render_cached_preview(
        &mut self,
        ticket: &JsStitchTicket,
    ) -> Result<JsValue, JsValue> {
        let info = self
            .inner
            .render_cached_preview(&ticket.inner)
            .map(preview_info)
            .map_err(to_js_error)?;
        to_js(&info)
    }

    /// Whether decoded images for exactly this image set are cached.
    pub fn has_cached(&self, key: &str) -> bool {
        self.inner.cached_images(key).is_some()
    }

    pub fn invalidate_cache(&mut self) {
        self.inner.invalidate_cache();
    }

    /// Copy of the preview canvas, or `undefined` before the first render.
    pub fn preview_image(&self) -> Option<JsDecodedImage> {
        self.inner
            .preview()
            .map(|preview| JsDecodedImage::from_decoded(preview.canvas.clone()))
    }

    /// Encode the preview with the current format and quality.
    ///
    /// Throws `kind: "noPreview"` before the first render.
    pub fn export(&self) -> Result<JsStitchOutput, JsValue> {
        let artifact = self.inner.export(chrono::Utc::now()).map_err(to_js_error)?;
        Ok(JsStitchOutput::from_output(artifact.output, Some(artifact.filename)))
    }
}

fn preview_info(preview: &framestack_core::session::Preview) -> JsPreviewInfo {
    JsPreviewInfo {
        width: preview.canvas.width,
        height: preview.canvas.height,
        contributing_images: preview.layout.contributing_images(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_core_images_keeps_order() {
        let images = vec![
            JsDecodedImage::new(1, 1, vec![1, 1, 1, 255]),
            JsDecodedImage::new(2, 1, vec![2; 8]),
        ];
        let core = into_core_images(images).unwrap();
        assert_eq!(core[0].width, 1);
        assert_eq!(core[1].width, 2);
    }

    #[test]
    fn test_preview_info() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        let preview = session
            .render_preview(&ticket, &[DecodedImage::new(3, 5, vec![0; 60])])
            .unwrap();
        let info = preview_info(preview);
        assert_eq!((info.width, info.height, info.contributing_images), (3, 5, 1));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn solid(width: u32, height: u32) -> JsDecodedImage {
        JsDecodedImage::new(width, height, vec![200; (width * height * 4) as usize])
    }

    #[wasm_bindgen_test]
    fn test_stitch_images_scenario() {
        let params = js_sys::JSON::parse(
            r#"{"cropTopPercent":10,"cropBottomPercent":10,"exportFormat":"png"}"#,
        )
        .unwrap();
        let images = vec![solid(100, 100), solid(200, 100), solid(150, 100)];
        let out = stitch_images(images, params).unwrap();
        assert_eq!((out.width(), out.height()), (200, 90 + 80 + 80));
        assert_eq!(out.mime_type(), "image/png");
    }

    #[wasm_bindgen_test]
    fn test_session_flow() {
        let mut session = JsStitchSession::new(JsValue::UNDEFINED).unwrap();
        assert!(session.export().is_err());

        let ticket = session.begin().unwrap();
        assert!(session.begin().is_err());
        session
            .render_preview(&ticket, vec![solid(4, 4), solid(4, 4)], Some("a,b".to_string()))
            .unwrap();
        assert!(session.has_cached("a,b"));
        session.finish(ticket).unwrap();

        let stale = session.begin().unwrap();
        session.cancel();
        assert!(session
            .render_preview(&stale, vec![solid(4, 4)], Some("c".to_string()))
            .is_err());
        assert!(session.has_cached("a,b"));
        assert!(!session.has_cached("c"));

        let out = session.export().unwrap();
        assert!(out.filename().unwrap().starts_with("stitched_image_"));
        assert_eq!(out.height(), 8);
    }
}
