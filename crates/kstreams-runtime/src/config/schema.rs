//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KStreamsConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults applied to every stream.
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Per-stream sections, matched to registered streams by name.
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

impl KStreamsConfig {
    /// Looks up the section for the stream called `name`.
    pub fn stream(&self, name: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Effective processing settings for `name`: the stream's overrides on
    /// top of the global defaults.
    pub fn processing_for(&self, name: &str) -> ProcessingConfig {
        let mut processing = self.processing.clone();
        if let Some(stream) = self.stream(name) {
            if let Some(max_in_flight) = stream.max_in_flight {
                processing.max_in_flight = max_in_flight;
            }
            if let Some(policy) = stream.on_extraction_error {
                processing.on_extraction_error = policy;
            }
        }
        processing
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation period for [`LogOutput::File`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Rotated files to keep; `0` keeps all of them.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module level overrides, e.g. `kstreams_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
            span_events: SpanEventConfig::default(),
        }
    }
}

fn default_max_files() -> usize {
    5
}

// =============================================================================
// Processing
// =============================================================================

/// What a stream does when a record's arguments cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and move on to the next record.
    #[default]
    Skip,
    /// End the stream with the failure.
    Stop,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Record processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum records handled concurrently by one stream.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default)]
    pub on_extraction_error: ErrorPolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            on_extraction_error: ErrorPolicy::default(),
        }
    }
}

fn default_max_in_flight() -> usize {
    1
}

// =============================================================================
// Streams
// =============================================================================

/// Per-stream configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Name of the registered stream this section applies to.
    pub name: String,

    /// Topics the stream accepts; empty accepts every topic.
    #[serde(default)]
    pub topics: Vec<String>,

    /// Disabled streams are not started.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub max_in_flight: Option<usize>,

    #[serde(default)]
    pub on_extraction_error: Option<ErrorPolicy>,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KStreamsConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.processing.max_in_flight, 1);
        assert_eq!(config.processing.on_extraction_error, ErrorPolicy::Skip);
        assert!(config.streams.is_empty());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: KStreamsConfig = serde_json::from_value(serde_json::json!({
            "logging": { "level": "debug", "format": "pretty" },
            "processing": { "on_extraction_error": "stop" },
            "streams": [
                { "name": "orders", "topics": ["orders"], "max_in_flight": 8 }
            ]
        }))
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.processing.on_extraction_error, ErrorPolicy::Stop);

        let orders = config.stream("orders").unwrap();
        assert!(orders.enabled);
        assert_eq!(orders.topics, ["orders"]);
    }

    #[test]
    fn test_stream_overrides_processing() {
        let config = KStreamsConfig {
            processing: ProcessingConfig {
                max_in_flight: 4,
                on_extraction_error: ErrorPolicy::Stop,
            },
            streams: vec![StreamConfig {
                name: "orders".into(),
                topics: Vec::new(),
                enabled: true,
                max_in_flight: Some(16),
                on_extraction_error: None,
            }],
            ..Default::default()
        };

        let orders = config.processing_for("orders");
        assert_eq!(orders.max_in_flight, 16);
        assert_eq!(orders.on_extraction_error, ErrorPolicy::Stop);

        assert_eq!(config.processing_for("other"), config.processing);
    }
}
