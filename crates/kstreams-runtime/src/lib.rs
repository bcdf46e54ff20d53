//! KStreams Runtime - Orchestration layer for kstreams handlers.
//!
//! This crate provides:
//! - Streams binding a solved handler to its processing settings (`Stream`)
//! - Record sources feeding streams (`RecordSource`, `ChannelSource`, `StreamSource`)
//! - Engine orchestration and shutdown handling (`StreamEngine`)
//! - figment-based configuration and logging setup
//!
//! The runtime does not speak to a broker. A consumer loop pushes records
//! into a [`ChannelSource`] and the engine takes it from there.
//!
//! ```ignore
//! use kstreams_runtime::{ChannelSource, Stream, StreamEngine};
//!
//! #[stream_handler]
//! async fn audit(#[header] tenant: FromHeader<String>, record: Arc<ConsumerRecord>) {
//!     info!(tenant = %tenant.0, offset = record.offset, "audited");
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Loads kstreams.toml and initializes logging from it
//!     let mut engine = StreamEngine::builder().build()?;
//!
//!     let (tx, source) = ChannelSource::channel(256);
//!     engine.add_stream(Stream::new("audit", audit, audit::parameters())?, source)?;
//!     spawn_consumer(tx);
//!
//!     // Run until Ctrl+C
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod source;
pub mod stream;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ErrorPolicy, KStreamsConfig, LoggingConfig,
    ProcessingConfig, StreamConfig,
};
pub use engine::{EngineBuilder, StreamEngine};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use source::{BoxedSource, ChannelSource, RecordSource, StreamSource};
pub use stream::{Stream, StreamOutcome, StreamService, StreamStats};

pub use tokio_util::sync::CancellationToken;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
