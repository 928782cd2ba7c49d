//! Values accepted by the escape entry points and their text forms

use std::borrow::Cow;
use std::fmt::{self, Write};

use tracing::trace;

use crate::error::{HamlyError, Result};
use crate::escape::escape_str;

/// Text form of [`Value::Absent`]
pub const ABSENT_TEXT: &str = "None";

/// Fallible conversion to text.
///
/// Implemented for every [`fmt::Display`] type; a formatter error becomes
/// [`HamlyError::Conversion`].
pub trait ToText {
    fn to_text(&self) -> Result<String>;
}

impl<T: fmt::Display + ?Sized> ToText for T {
    fn to_text(&self) -> Result<String> {
        let mut text = String::new();
        write!(text, "{}", self).map_err(|_| HamlyError::conversion(std::any::type_name::<T>()))?;
        Ok(text)
    }
}

/// A value handed to [`escape`] or [`soft_text`]
#[derive(Clone)]
pub enum Value<'a> {
    Int(i128),
    Float(f64),
    Bool(bool),
    Absent,
    Text(Cow<'a, str>),
    Other(&'a dyn ToText),
}

impl<'a> Value<'a> {
    pub fn other(value: &'a dyn ToText) -> Self {
        Value::Other(value)
    }

    /// Int, Float, Bool and Absent never contain markup characters
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Absent
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Absent => "absent",
            Value::Text(_) => "text",
            Value::Other(_) => "other",
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Absent => f.write_str("Absent"),
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Other(_) => f.write_str("Other(..)"),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Int(i128::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<isize> for Value<'_> {
    fn from(value: isize) -> Self {
        Value::Int(value as i128)
    }
}

impl From<usize> for Value<'_> {
    fn from(value: usize) -> Self {
        Value::Int(value as i128)
    }
}

impl From<f32> for Value<'_> {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Text(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Value::Text(value)
    }
}

impl<'a> From<&'a dyn ToText> for Value<'a> {
    fn from(value: &'a dyn ToText) -> Self {
        Value::Other(value)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Absent, Into::into)
    }
}

impl<'a> From<&'a serde_json::Value> for Value<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Value::Absent,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Int(i128::from(u))
                } else if let Some(x) = n.as_f64() {
                    Value::Float(x)
                } else {
                    Value::Other(n)
                }
            }
            Json::String(s) => Value::Text(Cow::Borrowed(s.as_str())),
            Json::Array(_) | Json::Object(_) => Value::Other(value),
        }
    }
}

/// Return `value` as text without escaping it.
///
/// Text is passed through untouched; everything else uses its default text
/// form.
pub fn soft_text<'a>(value: impl Into<Value<'a>>) -> Result<Cow<'a, str>> {
    match value.into() {
        Value::Int(n) => Ok(Cow::Owned(n.to_string())),
        // Debug keeps the fractional part: 1.0 rather than 1
        Value::Float(x) => Ok(Cow::Owned(format!("{x:?}"))),
        Value::Bool(b) => Ok(Cow::Owned(b.to_string())),
        Value::Absent => Ok(Cow::Borrowed(ABSENT_TEXT)),
        Value::Text(text) => Ok(text),
        Value::Other(other) => other.to_text().map(Cow::Owned),
    }
}

/// Escape any value for HTML output.
///
/// Scalars are converted straight to text and never scanned. Text is escaped
/// as is; other values are converted first, and a failed conversion is
/// returned to the caller.
pub fn escape<'a>(value: impl Into<Value<'a>>) -> Result<Cow<'a, str>> {
    match value.into() {
        Value::Text(Cow::Borrowed(text)) => Ok(escape_str(text)),
        Value::Text(Cow::Owned(text)) => Ok(Cow::Owned(escape_owned(text))),
        Value::Other(other) => other.to_text().map(|text| Cow::Owned(escape_owned(text))),
        scalar => {
            trace!(kind = scalar.kind(), "Scalar value, skipping scan");
            soft_text(scalar)
        }
    }
}

/// Attribute values are escaped exactly like text
pub fn quote_attr<'a>(value: impl Into<Value<'a>>) -> Result<Cow<'a, str>> {
    escape(value)
}

/// Escape an owned string, handing it back unchanged when nothing matched
fn escape_owned(text: String) -> String {
    let escaped = match escape_str(&text) {
        Cow::Owned(escaped) => Some(escaped),
        Cow::Borrowed(_) => None,
    };
    escaped.unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    struct Markup(&'static str);

    impl fmt::Display for Markup {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "<b>{}</b>", self.0)
        }
    }

    #[test]
    fn test_scalar_text_forms() {
        assert_eq!(escape(42).unwrap(), "42");
        assert_eq!(escape(-7i64).unwrap(), "-7");
        assert_eq!(escape(u64::MAX).unwrap(), "18446744073709551615");
        assert_eq!(escape(1.0).unwrap(), "1.0");
        assert_eq!(escape(0.5).unwrap(), "0.5");
        assert_eq!(escape(f64::INFINITY).unwrap(), "inf");
        assert_eq!(escape(true).unwrap(), "true");
        assert_eq!(escape(false).unwrap(), "false");
        assert_eq!(escape(None::<&str>).unwrap(), ABSENT_TEXT);
    }

    #[test]
    fn test_escape_text_value() {
        assert_eq!(escape("a<b").unwrap(), "a&lt;b");
        assert_eq!(escape(String::from("x & y")).unwrap(), "x &amp; y");
        assert_eq!(escape(Some("'q'")).unwrap(), "&#39;q&#39;");
    }

    #[test]
    fn test_escape_borrowed_fast_path() {
        assert!(matches!(escape("plain").unwrap(), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_other_value() {
        let markup = Markup("hi");
        assert_eq!(
            escape(Value::other(&markup)).unwrap(),
            "&lt;b&gt;hi&lt;/b&gt;"
        );
    }

    #[test]
    fn test_conversion_failure_propagates() {
        let broken = Broken;
        let err = escape(Value::other(&broken)).unwrap_err();
        assert!(matches!(err, HamlyError::Conversion { .. }));
        assert!(err.to_string().contains("Broken"));

        let err = soft_text(Value::other(&broken)).unwrap_err();
        assert!(matches!(err, HamlyError::Conversion { .. }));
    }

    #[test]
    fn test_soft_text_identity() {
        assert!(matches!(soft_text("a<b").unwrap(), Cow::Borrowed("a<b")));
        assert_eq!(soft_text(123).unwrap(), "123");
        assert_eq!(soft_text(Value::other(&Markup("x"))).unwrap(), "<b>x</b>");
    }

    #[test]
    fn test_quote_attr_matches_escape() {
        assert_eq!(quote_attr("\"v\"").unwrap(), "&#34;v&#34;");
    }

    #[test]
    fn test_is_scalar() {
        assert!(Value::from(1).is_scalar());
        assert!(Value::from(1.5).is_scalar());
        assert!(Value::from(true).is_scalar());
        assert!(Value::Absent.is_scalar());
        assert!(!Value::from("s").is_scalar());
        assert!(!Value::other(&Markup("x")).is_scalar());
    }

    #[test]
    fn test_json_mapping() {
        let json: serde_json::Value =
            serde_json::from_str(r#"[null, true, 3, 18446744073709551615, 2.5, "<s>", [1], {"a": 1}]"#)
                .unwrap();
        let items = json.as_array().unwrap();
        let kinds: Vec<_> = items.iter().map(|v| Value::from(v).kind()).collect();
        assert_eq!(
            kinds,
            vec!["absent", "bool", "int", "int", "float", "text", "other", "other"]
        );
        assert_eq!(escape(&items[5]).unwrap(), "&lt;s&gt;");
        assert_eq!(escape(&items[7]).unwrap(), "{&#34;a&#34;:1}");
    }
}
