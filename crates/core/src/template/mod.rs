//! Static HAML templates.
//!
//! Lines nest by two-space indent. `%tag.class#id{"json": "attrs"}` opens a
//! tag, `= path` writes an escaped context value, `/` starts a comment and any
//! other line is raw markup. Attributes go through [`crate::write_attrs`].

mod parser;
mod render;

pub use parser::{Node, TemplateParser};
pub use render::Template;
