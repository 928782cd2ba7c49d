/// Centralized error handling for hamly
pub mod cli;

pub use cli::{CliError, CliResult};
