//! # kstreams Core
//!
//! The record model shared by every kstreams crate.
//!
//! - [`ConsumerRecord`] - a record as delivered by the consumer loop
//! - [`Headers`] - the record's headers, mapping- or sequence-shaped
//! - [`HeaderValue`] - a single header value, text or raw bytes
//!
//! The resolution core in `kstreams-framework` reads these types but never
//! produces them; records come from whatever message source the runtime is
//! wired to.
//!
//! ## Example
//!
//! ```rust
//! use kstreams_core::{ConsumerRecord, HeaderValue};
//!
//! let record = ConsumerRecord::new("events")
//!     .with_header("event-type", "hello")
//!     .with_header("event-type", "again");
//!
//! assert_eq!(record.headers.last("event-type"), Some(&HeaderValue::from("again")));
//! ```

pub mod headers;
pub mod record;

pub use headers::{HeaderValue, Headers};
pub use record::ConsumerRecord;
