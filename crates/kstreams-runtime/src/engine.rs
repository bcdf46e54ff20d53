//! Stream engine: runs every registered stream until its source ends or
//! shutdown is requested.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kstreams_runtime::{ChannelSource, Stream, StreamEngine};
//!
//! // Auto-loads kstreams.toml from the current directory
//! let mut engine = StreamEngine::builder().build()?;
//!
//! let (tx, source) = ChannelSource::channel(64);
//! engine.add_stream(Stream::new("orders", on_order, on_order::parameters())?, source)?;
//!
//! // Feed `tx` from a consumer loop, then:
//! engine.run().await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ConfigLoader, ConfigResult, KStreamsConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::source::{BoxedSource, RecordSource};
use crate::stream::{Stream, StreamStats};

/// Owns a set of streams and drives them concurrently.
///
/// One stream ending with an error does not stop the others; the first
/// error is returned once every stream has finished.
pub struct StreamEngine {
    /// The configuration.
    config: KStreamsConfig,
    /// Registered streams, in registration order.
    streams: Vec<Arc<Stream>>,
    /// Sources of enabled streams that have not been started yet.
    sources: HashMap<String, BoxedSource>,
    /// Cancelled to stop every stream.
    shutdown: CancellationToken,
}

impl StreamEngine {
    /// Creates an engine without touching logging.
    pub fn new(config: KStreamsConfig) -> Self {
        Self {
            config,
            streams: Vec::new(),
            sources: HashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates an engine builder for custom configuration.
    ///
    /// ```rust,ignore
    /// let engine = StreamEngine::builder()
    ///     .config_file("config/production.toml")
    ///     .profile("production")
    ///     .build()?;
    /// ```
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Creates an engine from configuration and initializes logging from it.
    pub fn from_config(config: &KStreamsConfig) -> Self {
        // try_init won't panic if a subscriber is already installed
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            streams = config.streams.len(),
            "Stream engine initialized from configuration"
        );

        Self::new(config.clone())
    }

    pub fn config(&self) -> &KStreamsConfig {
        &self.config
    }

    /// Registers `stream`, fed by `source`.
    ///
    /// Settings the stream did not choose in code are taken from the
    /// `[[streams]]` section of the same name, then from `[processing]`.
    /// A stream disabled by configuration is registered but never started.
    pub fn add_stream(
        &mut self,
        mut stream: Stream,
        source: impl RecordSource,
    ) -> RuntimeResult<Arc<Stream>> {
        let name = stream.name().to_owned();
        if self.streams.iter().any(|s| s.name() == name) {
            return Err(RuntimeError::DuplicateStream(name));
        }

        let section = self.config.stream(&name);
        let enabled = section.is_none_or(|s| s.enabled);
        stream.apply_config(&self.config.processing_for(&name), section);

        let stream = Arc::new(stream);
        self.streams.push(Arc::clone(&stream));

        if enabled {
            self.sources.insert(name.clone(), Box::new(source));
            info!(
                stream = %name,
                topics = ?stream.subscribed_topics(),
                max_in_flight = stream.concurrency(),
                policy = %stream.error_policy(),
                "Registered stream"
            );
        } else {
            info!(stream = %name, "Stream disabled by configuration, it will not run");
        }

        Ok(stream)
    }

    pub fn stream(&self, name: &str) -> RuntimeResult<&Arc<Stream>> {
        self.streams
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| RuntimeError::StreamNotFound(name.to_owned()))
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Counters for the stream called `name`.
    pub fn stats(&self, name: &str) -> RuntimeResult<StreamStats> {
        self.stream(name).map(|s| s.stats())
    }

    /// A token that stops the engine when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Asks every running stream to stop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Runs until every stream has ended or a shutdown signal (Ctrl+C or
    /// SIGTERM) is received.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        info!("Stream engine is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_signal()).await
    }

    /// Runs until every stream has ended or `shutdown` completes.
    ///
    /// Each stream's source is consumed by the call, so streams only run
    /// once.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let token = self.shutdown.clone();
        let mut tasks = JoinSet::new();

        for stream in &self.streams {
            let Some(source) = self.sources.remove(stream.name()) else {
                continue;
            };
            let stream = Arc::clone(stream);
            let token = token.clone();
            tasks.spawn(async move { stream.run(source, token).await });
        }

        if tasks.is_empty() {
            warn!("No streams to run");
            return Ok(());
        }
        info!(streams = tasks.len(), "Stream engine started");

        let mut shutdown = std::pin::pin!(shutdown);
        let mut first_error = None;

        loop {
            tokio::select! {
                () = &mut shutdown, if !token.is_cancelled() => {
                    info!("Shutdown requested, stopping streams");
                    token.cancel();
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    let result = joined.map_err(RuntimeError::from).and_then(|r| r);
                    if let Err(err) = result {
                        error!(error = %err, "Stream ended with an error");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }

        info!("Stream engine stopped");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for StreamEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEngine")
            .field("streams", &self.streams)
            .field("pending", &self.sources.keys().collect::<Vec<_>>())
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

// =============================================================================
// EngineBuilder
// =============================================================================

/// Builder for creating a [`StreamEngine`] with custom configuration.
pub struct EngineBuilder {
    config_loader: ConfigLoader,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: KStreamsConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the engine.
    pub fn build(self) -> ConfigResult<StreamEngine> {
        let config = self.config_loader.load()?;
        Ok(StreamEngine::from_config(&config))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
