/// Unified error type for hamly
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HamlyError {
    // A value's text conversion failed
    #[error("Failed to convert {type_name} to text")]
    Conversion { type_name: &'static str },

    // The output sink rejected a write
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),

    // Input could not be read as a value
    #[error("Parse error: {0}")]
    Parse(String),

    // A template line could not be parsed
    #[error("Template error on line {line}: {message}")]
    Template { line: usize, message: String },

    // A template output line names a value missing from the context
    #[error("Undefined template value: {0}")]
    Undefined(String),
}

/// Result type alias using HamlyError
pub type Result<T> = std::result::Result<T, HamlyError>;

impl HamlyError {
    /// Create a conversion error for the given type
    pub fn conversion(type_name: &'static str) -> Self {
        Self::Conversion { type_name }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a template error for the given source line
    pub fn template(line: usize, message: impl Into<String>) -> Self {
        Self::Template {
            line,
            message: message.into(),
        }
    }

    /// Create an undefined value error
    pub fn undefined(path: impl Into<String>) -> Self {
        Self::Undefined(path.into())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HamlyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
