// JavaScript-friendly types for WASM bindings

use serde::{Deserialize, Serialize};

use crate::escape::EscapeMode;

/// JavaScript-friendly escape mode
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsEscapeMode {
    #[default]
    Full,
    Minimal,
}

/// JavaScript-friendly escape options
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JsEscapeOptions {
    #[serde(default)]
    pub mode: JsEscapeMode,
}

/// JavaScript-friendly attribute pair
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsAttribute {
    pub name: String,
    pub value: serde_json::Value,
}

// ============================================================================
// Type conversions between JS types and Rust API types
// ============================================================================

impl From<JsEscapeMode> for EscapeMode {
    fn from(mode: JsEscapeMode) -> Self {
        match mode {
            JsEscapeMode::Full => EscapeMode::Full,
            JsEscapeMode::Minimal => EscapeMode::Minimal,
        }
    }
}
