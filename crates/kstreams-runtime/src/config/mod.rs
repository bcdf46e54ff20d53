//! Configuration module for the kstreams runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, record processing and per-stream settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ErrorPolicy, KStreamsConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    ProcessingConfig, SpanEventConfig, StreamConfig,
};
pub use validation::validate_config;
