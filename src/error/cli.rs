/// Command line error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Escape error: {0}")]
    Escape(#[from] hamly_core::HamlyError),
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Missing required input: {0}")]
    MissingInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CliError {
    /// Create a missing input error
    pub fn missing_input(name: impl Into<String>) -> Self {
        Self::MissingInput(name.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type alias for command operations
pub type CliResult<T> = Result<T, CliError>;
