// WASM API bindings - JavaScript-callable functions

use super::types::{JsAttribute, JsEscapeOptions};
use wasm_bindgen::prelude::*;

fn from_js(value: JsValue) -> Result<serde_json::Value, JsValue> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to read value: {}", e)))
}

/// Escape a JavaScript value for HTML output
///
/// # Arguments
/// * `value` - Any JSON-compatible value; numbers, booleans and null are
///   converted to text without escaping
///
/// # Errors
/// Returns a JsValue error if the value cannot be read
#[wasm_bindgen]
pub fn escape(value: JsValue) -> Result<String, JsValue> {
    let json = from_js(value)?;
    crate::api::escape(&json)
        .map(|text| text.into_owned())
        .map_err(|e| JsValue::from_str(&format!("Escape failed: {}", e)))
}

/// Convert a JavaScript value to text without escaping
#[wasm_bindgen]
pub fn soft_text(value: JsValue) -> Result<String, JsValue> {
    let json = from_js(value)?;
    crate::api::soft_text(&json)
        .map(|text| text.into_owned())
        .map_err(|e| JsValue::from_str(&format!("Conversion failed: {}", e)))
}

/// Escape a string with the given options
///
/// # Arguments
/// * `text` - Input text
/// * `options_js` - Optional `{ mode: "full" | "minimal" }`
#[wasm_bindgen]
pub fn escape_text(text: &str, options_js: JsValue) -> Result<String, JsValue> {
    let options: JsEscapeOptions = if options_js.is_undefined() || options_js.is_null() {
        JsEscapeOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options_js)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))?
    };

    let mode: crate::escape::EscapeMode = options.mode.into();
    Ok(mode.apply(text).into_owned())
}

/// Render an attribute list
///
/// # Arguments
/// * `attrs_js` - Array of `{ name, value }` objects
#[wasm_bindgen]
pub fn render_attrs(attrs_js: JsValue) -> Result<String, JsValue> {
    let attrs: Vec<JsAttribute> = serde_wasm_bindgen::from_value(attrs_js)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse attributes: {}", e)))?;

    crate::api::render_attrs(attrs.iter().map(|a| (a.name.as_str(), &a.value)))
        .map_err(|e| JsValue::from_str(&format!("Render failed: {}", e)))
}

/// Render a static template
///
/// # Arguments
/// * `source` - Template source
/// * `context_js` - Optional object supplying the values of `=` lines
#[wasm_bindgen]
pub fn render_template(source: &str, context_js: JsValue) -> Result<String, JsValue> {
    let context = from_js(context_js)?;
    crate::api::render_template(source, &context)
        .map_err(|e| JsValue::from_str(&format!("Render failed: {}", e)))
}
