// WASM bindings module - only compiled when wasm feature is enabled

pub mod api;
pub mod types;

pub use api::{escape, escape_text, render_attrs, render_template, soft_text};

use wasm_bindgen::prelude::*;

/// Install the panic hook so panics reach the browser console
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}
