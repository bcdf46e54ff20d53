//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{KStreamsConfig, LogOutput, LoggingConfig, ProcessingConfig, StreamConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &KStreamsConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_processing_config(&config.processing)?;
    validate_streams_config(&config.streams)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_processing_config(processing: &ProcessingConfig) -> ConfigResult<()> {
    validate_max_in_flight(processing.max_in_flight)
}

fn validate_max_in_flight(max_in_flight: usize) -> ConfigResult<()> {
    if max_in_flight == 0 {
        return Err(ConfigError::validation(
            "max_in_flight must be greater than 0",
        ));
    }
    Ok(())
}

/// Validates all stream sections.
fn validate_streams_config(streams: &[StreamConfig]) -> ConfigResult<()> {
    let mut seen_names = HashSet::new();

    for stream in streams {
        if !seen_names.insert(&stream.name) {
            return Err(ConfigError::DuplicateStream(stream.name.clone()));
        }

        validate_stream_config(stream)?;
    }

    Ok(())
}

fn validate_stream_config(stream: &StreamConfig) -> ConfigResult<()> {
    if stream.name.is_empty() {
        return Err(ConfigError::missing_field("streams.name"));
    }

    if stream.name.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Stream name `{}` cannot contain whitespace",
            stream.name
        )));
    }

    if stream.topics.iter().any(String::is_empty) {
        return Err(ConfigError::validation(format!(
            "Stream `{}` lists an empty topic name",
            stream.name
        )));
    }

    if let Some(max_in_flight) = stream.max_in_flight {
        validate_max_in_flight(max_in_flight)?;
    }

    Ok(())
}
