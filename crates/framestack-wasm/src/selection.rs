//! Selection tracking bindings.
//!
//! The host's selection API is asynchronous, so JavaScript fetches the
//! selection itself and feeds each snapshot to the tracker:
//!
//! ```typescript
//! const tracker = new JsSelectionTracker();
//! setInterval(async () => {
//!   const changed = tracker.update(await eagle.item.getSelected());
//!   if (changed) {
//!     const issues = validate_selection(changed);
//!     issues.length ? showIssues(issues) : restitch(changed);
//!   }
//! }, 1000);
//! ```

use framestack_core::selection::{
    self, SelectedImage, SelectionError, SelectionSource, SelectionTracker,
};
use wasm_bindgen::prelude::*;

use crate::error::to_js_error;
use crate::params::to_js;
use crate::types::JsNotice;

/// A selection already fetched by JavaScript.
struct Snapshot(Vec<SelectedImage>);

impl SelectionSource for Snapshot {
    fn selected(&self) -> Result<Vec<SelectedImage>, SelectionError> {
        Ok(self.0.clone())
    }
}

fn items_from_js(items: JsValue) -> Result<Vec<SelectedImage>, JsValue> {
    if items.is_undefined() || items.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(items).map_err(to_js_error)
}

/// Detects when the host's selection changes.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsSelectionTracker {
    inner: SelectionTracker,
}

#[wasm_bindgen]
impl JsSelectionTracker {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsSelectionTracker {
        Self::default()
    }

    /// Feed the current selection. Returns it back if it differs from the
    /// previous one (ordered ids), otherwise `null`.
    pub fn update(&mut self, items: JsValue) -> Result<JsValue, JsValue> {
        let snapshot = Snapshot(items_from_js(items)?);
        match self.inner.poll_once(&snapshot).map_err(to_js_error)? {
            Some(changed) => to_js(&changed),
            None => Ok(JsValue::NULL),
        }
    }

    /// Forget the previous selection so the next update reports again.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Check a selection before stitching.
///
/// Returns a list of `{ kind, message, ... }` issues; empty means OK.
#[wasm_bindgen]
pub fn validate_selection(items: JsValue) -> Result<JsValue, JsValue> {
    let items = items_from_js(items)?;
    let issues: Vec<_> = selection::validate_selection(&items)
        .into_iter()
        .map(JsNotice::new)
        .collect();
    to_js(&issues)
}

/// Cache key for a selection: its ids joined with `,`.
#[wasm_bindgen]
pub fn selection_key(items: JsValue) -> Result<String, JsValue> {
    Ok(selection::selection_key(&items_from_js(items)?))
}
