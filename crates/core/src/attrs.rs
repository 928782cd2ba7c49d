//! Attribute list rendering
//!
//! Pairs are sorted by name and unescaped value, escaped, and pairs sharing a
//! name are merged into one space separated attribute:
//!
//! ```
//! use hamly_core::render_attrs;
//!
//! let attrs = render_attrs([("class", "b"), ("id", "x<"), ("class", "a")]).unwrap();
//! assert_eq!(attrs, " class='a b' id='x&lt;'");
//! ```

use std::borrow::Cow;
use std::fmt::Write;

use tracing::trace;

use crate::error::Result;
use crate::escape::escape_into;
use crate::value::{Value, soft_text};

/// Render `(name, value)` pairs into a string.
pub fn render_attrs<'a, I, K, V>(pairs: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value<'a>>,
{
    let mut output = String::new();
    write_attrs(pairs, &mut output)?;
    Ok(output)
}

/// Write `(name, value)` pairs into `dest`. Pairs with an empty name are
/// skipped.
pub fn write_attrs<'a, I, K, V>(pairs: I, mut dest: impl Write) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value<'a>>,
{
    let mut attrs: Vec<(K, Cow<'a, str>)> = Vec::new();
    for (name, value) in pairs {
        if name.as_ref().is_empty() {
            continue;
        }
        let value = soft_text(value)?;
        attrs.push((name, value));
    }
    attrs.sort_by(|a, b| (a.0.as_ref(), a.1.as_ref()).cmp(&(b.0.as_ref(), b.1.as_ref())));
    trace!("Writing {} attribute values", attrs.len());

    let mut current: Option<&str> = None;
    for (name, value) in &attrs {
        let name = name.as_ref();
        if current == Some(name) {
            dest.write_char(' ')?;
        } else {
            if current.is_some() {
                dest.write_char('\'')?;
            }
            write!(dest, " {name}='")?;
            current = Some(name);
        }
        escape_into(&mut dest, value)?;
    }
    if current.is_some() {
        dest.write_char('\'')?;
    }

    Ok(())
}
