//! Runtime error types.

use kstreams_framework::{BuildError, ExtractError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A stream's handler could not be compiled into a resolution plan.
    #[error("Failed to build handler for stream `{stream}`: {source}")]
    Build {
        stream: String,
        #[source]
        source: BuildError,
    },

    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A stream using the `stop` policy hit an extraction failure.
    #[error("Stream `{stream}` stopped after an extraction failure: {source}")]
    Extraction {
        stream: String,
        #[source]
        source: ExtractError,
    },

    /// Stream already registered.
    #[error("Stream already exists: {0}")]
    DuplicateStream(String),

    /// Stream not registered.
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// A stream task panicked or was aborted.
    #[error("Stream task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
