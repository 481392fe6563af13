//! Parameter validation bindings.
//!
//! # Example
//!
//! ```typescript
//! import { validate_parameters } from '@framestack/wasm';
//!
//! const result = validate_parameters(
//!   { cropTopPercent: topInput.value, cropBottomPercent: 50, exportFormat: 'jpg', exportQuality: 0.92 },
//!   'cropTopPercent',
//! );
//! result.notices.forEach((n) => showToast(n.message));
//! topInput.value = result.params.cropTopPercent;
//! ```

use framestack_core::params::Validated;
use framestack_core::{validate, AdjustingField, Adjustment, CropParameters, RawParameters};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::to_js_error;
use crate::types::JsNotice;

/// What `validate_parameters` hands back to JavaScript.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsValidated {
    pub params: CropParameters,
    pub notices: Vec<JsNotice<Adjustment>>,
    /// Largest top crop allowed next to the current bottom crop.
    pub remaining_for_top: f64,
    /// Largest bottom crop allowed next to the current top crop.
    pub remaining_for_bottom: f64,
}

impl From<Validated> for JsValidated {
    fn from(validated: Validated) -> Self {
        let params = validated.params;
        Self {
            params,
            notices: validated.adjustments.into_iter().map(JsNotice::new).collect(),
            remaining_for_top: params.remaining_for_top(),
            remaining_for_bottom: params.remaining_for_bottom(),
        }
    }
}

/// Read raw parameters from a JS object.
pub(crate) fn raw_from_js(raw: JsValue) -> Result<RawParameters, JsValue> {
    if raw.is_undefined() || raw.is_null() {
        return Ok(RawParameters::default());
    }
    serde_wasm_bindgen::from_value(raw).map_err(to_js_error)
}

/// Read raw parameters and validate them without an edited field.
pub(crate) fn params_from_js(raw: JsValue) -> Result<CropParameters, JsValue> {
    Ok(validate(&raw_from_js(raw)?, None).params)
}

/// Serialize to plain JS objects; flattened notices would otherwise come out
/// as `Map`s.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

/// Validate raw UI values.
///
/// `raw` is an object with any of `cropTopPercent`, `cropBottomPercent`,
/// `exportFormat`, `exportQuality`; numbers or numeric strings. `adjusting`
/// is the id of the input being edited (`cropTopPercent`, `cropBottomSlider`,
/// ...), or omitted.
///
/// Returns `{ params, notices, remainingForTop, remainingForBottom }`.
#[wasm_bindgen]
pub fn validate_parameters(raw: JsValue, adjusting: Option<String>) -> Result<JsValue, JsValue> {
    let raw = raw_from_js(raw)?;
    let field = adjusting.as_deref().and_then(AdjustingField::parse);
    to_js(&JsValidated::from(validate(&raw, field)))
}

/// Default parameters as a plain object.
#[wasm_bindgen]
pub fn default_parameters() -> Result<JsValue, JsValue> {
    to_js(&CropParameters::default())
}
