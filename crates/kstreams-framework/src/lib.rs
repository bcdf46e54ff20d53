//! # kstreams framework
//!
//! Per-record argument resolution for stream handlers.
//!
//! A handler is a plain async function. Its parameters say what it needs:
//! the record itself, or values pulled out of the record by *extractors*.
//! The pieces fit together like this:
//!
//! - [`Marker`]s ([`Header`], wrapped in [`BindingMarker`]) declare how a
//!   parameter is bound;
//! - [`PlanBuilder`] compiles a handler and its [`Param`] descriptors into an
//!   immutable [`ResolutionPlan`], once;
//! - [`execute`] runs a handler against one record inside a fresh
//!   [`InvocationScope`], extracting distinct values concurrently;
//! - [`SolvedHandler`] bundles a handler with its plan and is a
//!   `tower::Service<Arc<ConsumerRecord>>`.
//!
//! ```rust
//! use kstreams_framework::{ConsumerRecord, FromHeader, Param, SolvedHandler};
//!
//! async fn on_event(record: ConsumerRecord, event_type: FromHeader<String>) -> String {
//!     format!("{}: {}", record.topic, event_type.into_inner())
//! }
//!
//! # tokio_test::block_on(async {
//! let solved = SolvedHandler::build(on_event, [Param::new("record"), Param::new("event_type")])
//!     .unwrap();
//!
//! let record = ConsumerRecord::new("events").with_header("event-type", "hello");
//! assert_eq!(solved.execute(record).await.unwrap(), "events: hello");
//! # });
//! ```

pub mod argument;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod handler;
pub mod marker;
pub mod plan;
pub mod scope;

pub use argument::{Argument, FromArgument, FromHeader};
pub use error::{BuildError, BuildResult, ExtractError, ExtractResult};
pub use executor::{BoxedRecordService, SolvedHandler, execute};
pub use extractor::{Extract, Extractor, ExtractorKind, HeaderExtractor};
pub use handler::{Handler, ParameterType};
pub use marker::{BindingMarker, Header, Marker};
pub use plan::{Binding, Param, PlanBuilder, PlannedParameter, ResolutionPlan};
pub use scope::InvocationScope;

pub use kstreams_core::{ConsumerRecord, HeaderValue, Headers};
