//! Error types for the fan-out hub
//!
//! Only failures that happen before dispatch begins are request-level errors.
//! Per-node failures are carried as [`crate::dispatch::DispatchOutcome`] data.

use thiserror::Error;

use crate::nodes::LoadError;

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the hub
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound request failed validation (no downstream calls were made)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Node source could not be loaded
    #[error("node source error: {0}")]
    Load(#[from] LoadError),

    /// HTTP client error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
