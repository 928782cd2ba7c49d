//! Text escaping
//!
//! All substituted characters are ASCII, and every byte of a multi-byte UTF-8
//! sequence is at least 0x80, so scanning bytes finds exactly the characters
//! to replace and every split point is a char boundary.

pub mod table;

use std::borrow::Cow;
use std::fmt;

pub use table::{HTML, SubstitutionTable, TEXT};

/// Which characters get replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// `"`, `'`, `&`, `<` and `>`
    #[default]
    Full,
    /// `&`, `<` and `>` only
    Minimal,
}

impl EscapeMode {
    pub fn table(self) -> &'static SubstitutionTable {
        match self {
            EscapeMode::Full => &HTML,
            EscapeMode::Minimal => &TEXT,
        }
    }

    pub fn apply(self, input: &str) -> Cow<'_, str> {
        escape_with(self.table(), input)
    }
}

/// Escape `"`, `'`, `&`, `<` and `>` in `input`.
///
/// Returns the input borrowed when nothing needs replacing.
///
/// ```
/// use hamly_core::escape_str;
///
/// assert_eq!(escape_str("a<b>c&d\"e'f"), "a&lt;b&gt;c&amp;d&#34;e&#39;f");
/// ```
pub fn escape_str(input: &str) -> Cow<'_, str> {
    escape_with(&HTML, input)
}

/// Escape only `&`, `<` and `>`, leaving quotes alone.
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape_with(&TEXT, input)
}

/// Escape `input` with an arbitrary table.
///
/// The first pass counts substitution sites and the extra length; the second
/// pass fills a buffer allocated once at its final size.
pub fn escape_with<'a>(table: &SubstitutionTable, input: &'a str) -> Cow<'a, str> {
    let bytes = input.as_bytes();
    let (sites, delta) = table.measure(bytes);
    if sites == 0 {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + delta);
    let mut remaining = sites;
    let mut start = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let Some(entry) = table.get(byte) else {
            continue;
        };
        output.push_str(&input[start..i]);
        output.push_str(entry.fragment);
        start = i + 1;

        remaining -= 1;
        if remaining == 0 {
            break;
        }
    }
    output.push_str(&input[start..]);

    debug_assert_eq!(output.len(), input.len() + delta);
    Cow::Owned(output)
}

/// Write the escaped form of `input` into `dest` without building a string.
pub fn escape_into(dest: impl fmt::Write, input: &str) -> fmt::Result {
    escape_into_with(&HTML, dest, input)
}

pub fn escape_into_with(
    table: &SubstitutionTable,
    mut dest: impl fmt::Write,
    input: &str,
) -> fmt::Result {
    let mut start = 0;
    for (i, &byte) in input.as_bytes().iter().enumerate() {
        if let Some(entry) = table.get(byte) {
            dest.write_str(&input[start..i])?;
            dest.write_str(entry.fragment)?;
            start = i + 1;
        }
    }
    dest.write_str(&input[start..])
}
