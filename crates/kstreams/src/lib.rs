//! # KStreams
//!
//! Typed, per-record argument resolution for stream-processing handlers.
//!
//! ## Overview
//!
//! A handler is a plain async function. Its parameters are either supplied
//! by the framework (the consumer record itself) or resolved from the
//! record by an extractor, for example a header lookup. Binding happens
//! once, when the handler is registered; every record then runs through the
//! same resolution plan.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌─────────────────────────────┐
//! │ RecordSource │────▶│ Stream             │────▶│ InvocationScope (per record)│──▶ handler
//! │ (consumer)   │     │ (ResolutionPlan)   │     │ resolves extractors once    │
//! └──────────────┘     └────────────────────┘     └─────────────────────────────┘
//! ```
//!
//! - **Markers**: Declare how a parameter is produced (`#[header]`, `Header`)
//! - **Extractors**: Deduplicated lookups shared by the parameters that need them
//! - **Plans**: Built per handler, map each parameter to a framework value or an extractor
//! - **Scopes**: Hold one record's resolved values for the length of one invocation
//! - **Engine**: Runs streams concurrently with configured limits and error policies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kstreams::prelude::*;
//!
//! #[stream_handler(crate = "::kstreams::framework")]
//! async fn audit(
//!     record: Arc<ConsumerRecord>,
//!     #[header] tenant_id: String,
//!     #[header(alias = "X-Trace")] trace: Option<String>,
//! ) {
//!     info!(tenant = %tenant_id, ?trace, offset = record.offset, "audited");
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = StreamEngine::builder().build()?;
//!
//!     let (tx, source) = ChannelSource::channel(256);
//!     engine.add_stream(Stream::new("audit", audit, audit::parameters())?, source)?;
//!     spawn_consumer(tx);
//!
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! `#[stream_handler]` expands to paths under `::kstreams_framework` by
//! default. Crates depending only on this facade pass
//! `crate = "::kstreams::framework"` as shown above.
//!
//! ## Features
//!
//! - `macros`: Enable the `#[stream_handler]` attribute (default)
//! - `toml-config`: Load `kstreams.toml` files (default)
//! - `yaml-config`: Load `kstreams.yaml` files
//! - `json-log`: Enable the JSON log format

pub use kstreams_core as core;
pub use kstreams_framework as framework;
pub use kstreams_runtime as runtime;

#[cfg(feature = "macros")]
pub use kstreams_macros::stream_handler;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use kstreams::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Engine - main entry point
    pub use kstreams_runtime::{
        ChannelSource, ErrorPolicy, RecordSource, Stream, StreamEngine, StreamOutcome,
        StreamSource,
    };

    // Records
    pub use kstreams_core::{ConsumerRecord, HeaderValue, Headers};

    // Handler parameters and markers
    pub use kstreams_framework::{FromHeader, Header, Param, SolvedHandler};

    #[cfg(feature = "macros")]
    pub use kstreams_macros::stream_handler;

    // Logging macros
    pub use kstreams_runtime::prelude::*;
}
