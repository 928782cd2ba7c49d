//! HTML entity escaping for template output.
//!
//! The crate is pure logic with no I/O. [`escape`] and [`soft_text`] are the
//! two entry points; [`api`] re-exports them together with the attribute
//! helpers and static [`template`] rendering as a stable facade.

pub mod api;
pub mod attrs;
pub mod error;
pub mod escape;
pub mod template;
pub mod value;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use attrs::{render_attrs, write_attrs};
pub use error::{HamlyError, Result};
pub use escape::{escape_into, escape_str, escape_text};
pub use template::Template;
pub use value::{ToText, Value, escape, quote_attr, soft_text};
