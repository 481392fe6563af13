//! Conversion of core errors into JavaScript exceptions.
//!
//! Every error thrown across the boundary is a JS `Error` whose `message` is
//! the Rust `Display` text and whose `kind` property is a stable tag the UI
//! can switch on.

use std::fmt::Display;

use framestack_core::decode::DecodeError;
use framestack_core::encode::EncodeError;
use framestack_core::export::ExportError;
use framestack_core::selection::SelectionError;
use framestack_core::storage::StorageError;
use framestack_core::StitchError;
use wasm_bindgen::prelude::*;

/// An error with a stable machine-readable tag.
pub(crate) trait JsErrorKind: Display {
    fn js_kind(&self) -> &'static str;
}

impl JsErrorKind for StitchError {
    fn js_kind(&self) -> &'static str {
        self.kind()
    }
}

impl JsErrorKind for DecodeError {
    fn js_kind(&self) -> &'static str {
        match self {
            DecodeError::BufferMismatch { .. } => "invalidArgument",
            DecodeError::InvalidFormat | DecodeError::CorruptedFile(_) => "decode",
        }
    }
}

impl JsErrorKind for EncodeError {
    fn js_kind(&self) -> &'static str {
        "encode"
    }
}

impl JsErrorKind for ExportError {
    fn js_kind(&self) -> &'static str {
        match self {
            ExportError::Stitch(e) => e.kind(),
            ExportError::Sink(_) => "sink",
        }
    }
}

impl JsErrorKind for StorageError {
    fn js_kind(&self) -> &'static str {
        "storage"
    }
}

impl JsErrorKind for SelectionError {
    fn js_kind(&self) -> &'static str {
        "selection"
    }
}

impl JsErrorKind for serde_wasm_bindgen::Error {
    fn js_kind(&self) -> &'static str {
        "invalidArgument"
    }
}

/// Build the JS `Error` for `err`.
pub(crate) fn to_js_error<E: JsErrorKind>(err: E) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    // Setting a property on a fresh Error object cannot fail
    let _ = js_sys::Reflect::set(
        &error,
        &JsValue::from_str("kind"),
        &JsValue::from_str(err.js_kind()),
    );
    error.into()
}

/// Readable text for an exception thrown by a browser API.
pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
