// Stable API facade for external consumers - Pure logic, no I/O

use crate::error::Result;
use crate::value::Value;

pub use crate::attrs::{render_attrs, write_attrs};
pub use crate::escape::{EscapeMode, escape_into, escape_str, escape_text};
pub use crate::template::Template;
pub use crate::value::{ToText, escape, quote_attr, soft_text};

/// Parse one JSON document and escape it.
///
/// `null`, booleans and numbers take their default text form, strings are
/// escaped, and arrays or objects are escaped as compact JSON.
pub fn escape_json(source: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(source)?;
    escape(&json).map(|text| text.into_owned())
}

/// Parse one JSON document and return its text form without escaping.
pub fn soft_text_json(source: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(source)?;
    soft_text(&json).map(|text| text.into_owned())
}

/// Escape every value of a JSON array, or a single non-array value.
pub fn escape_json_values(json: &serde_json::Value) -> Result<Vec<String>> {
    match json {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| escape(item).map(|text| text.into_owned()))
            .collect(),
        other => Ok(vec![escape(other)?.into_owned()]),
    }
}

/// Render attributes from JSON: either an array of `[name, value]` pairs or
/// an object whose values may themselves be arrays of values.
pub fn render_json_attrs(json: &serde_json::Value) -> Result<String> {
    use crate::error::HamlyError;
    use serde_json::Value as Json;

    let mut pairs: Vec<(&str, Value<'_>)> = Vec::new();
    match json {
        Json::Array(items) => {
            for item in items {
                match item.as_array().map(Vec::as_slice) {
                    Some([Json::String(name), value]) => pairs.push((name.as_str(), value.into())),
                    _ => {
                        return Err(HamlyError::parse(format!(
                            "expected a [name, value] pair, found {item}"
                        )));
                    }
                }
            }
        }
        Json::Object(map) => {
            for (name, value) in map {
                match value {
                    Json::Array(values) => {
                        pairs.extend(values.iter().map(|v| (name.as_str(), v.into())));
                    }
                    value => pairs.push((name.as_str(), value.into())),
                }
            }
        }
        other => {
            return Err(HamlyError::parse(format!(
                "expected an array or object of attributes, found {other}"
            )));
        }
    }
    render_attrs(pairs)
}

/// Parse a template and render it with a JSON context
pub fn render_template(source: &str, context: &serde_json::Value) -> Result<String> {
    Template::parse(source)?.render(context)
}
