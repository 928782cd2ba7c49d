/// Centralized error handling for hamly
pub mod hamly;

pub use hamly::{HamlyError, Result};
