//! CLI-level errors.

use teachable_vision::TeachError;

/// Errors surfaced by the trainer binary. Each maps to a single
/// user-facing message; none is fatal to an interactive caller.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Vision(#[from] TeachError),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type CliResult<T> = Result<T, CliError>;
