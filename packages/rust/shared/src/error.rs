//! Error types for TrainSet.
//!
//! Library crates use [`TrainSetError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only run-terminating conditions live here. Per-URL fetch failures and
//! per-chunk annotation failures are absorbed by the stage that produced them
//! and reported as data, never propagated as a `TrainSetError`.

use std::path::PathBuf;

/// Top-level error type for all TrainSet operations.
#[derive(Debug, thiserror::Error)]
pub enum TrainSetError {
    /// Invalid or unloadable configuration. Raised before any network activity.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Network/HTTP error outside the per-source scrape loop.
    #[error("network error: {0}")]
    Network(String),

    /// Response or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Language-model invocation error (transport, API status, empty response).
    #[error("model error: {0}")]
    Model(String),

    /// URL discovery produced nothing to scrape.
    #[error("no usable URLs discovered for topic '{topic}'")]
    NoUrlsDiscovered { topic: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Dataset serialization or sink error.
    #[error("export error: {0}")]
    Export(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrainSetError>;

impl TrainSetError {
    /// Create a configuration error from any displayable message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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
}
