//! Error types for PrepAgent.
//!
//! Library crates use [`PrepAgentError`] via `thiserror`.
//! The TUI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PrepAgent operations.
#[derive(Debug, thiserror::Error)]
pub enum PrepAgentError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// User input rejected before any request was issued.
    #[error("{message}")]
    Validation { message: String },

    /// Transport-level failure talking to the model provider.
    #[error("network error: {0}")]
    Network(String),

    /// The model provider answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// One-shot plan generation failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// A streamed chat response failed before or during delivery.
    #[error("stream error: {0}")]
    Stream(String),

    /// Malformed response payload.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrepAgentError>;

impl PrepAgentError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised by input validation (no request was made).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
