//! Conversions between JS values and engine types.

use marktint_browser::{AnnotateError, AnnotatorConfig, PassReport};
use wasm_bindgen::prelude::*;

/// Decode a configuration object. `undefined` and `null` mean defaults.
pub fn parse_config(value: JsValue) -> Result<AnnotatorConfig, AnnotateError> {
    if value.is_undefined() || value.is_null() {
        return Ok(AnnotatorConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| AnnotateError::Config(e.to_string()))
}

/// Render a pass report as a plain JS object.
pub fn report_to_js(report: &PassReport) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(report)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

pub fn to_js_error(err: AnnotateError) -> JsError {
    JsError::new(&err.to_string())
}
