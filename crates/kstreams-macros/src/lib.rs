//! Procedural macros for the kstreams framework.
//!
//! This crate provides:
//!
//! - `#[stream_handler]` - Generates parameter descriptors for a handler
//!
//! # Handler System
//!
//! Handlers are plain async functions; the `Handler` trait is implemented for
//! them by blanket implementations, similar to Axum's approach. What the type
//! system cannot see is the *names* of the parameters, which header lookups
//! derive their keys from. `#[stream_handler]` records those names, plus any
//! `#[header(...)]` settings, so the plan can be built without writing the
//! descriptor list by hand.
//!
//! ```rust,ignore
//! use kstreams_framework::{ConsumerRecord, SolvedHandler};
//! use kstreams_macros::stream_handler;
//!
//! #[stream_handler]
//! async fn on_event(
//!     record: ConsumerRecord,
//!     #[header] event_type: String,
//!     #[header(alias = "X-Trace")] trace: Option<String>,
//! ) {
//!     println!("{} {event_type} {trace:?}", record.offset);
//! }
//!
//! let solved = SolvedHandler::build(on_event, on_event::parameters())?;
//! ```

mod handler;

use proc_macro::TokenStream;
use syn::{ItemFn, parse_macro_input};

use handler::HandlerArgs;

/// Emits a `parameters()` function describing the handler's parameters.
///
/// The function is placed in a module named after the handler, so
/// `on_event::parameters()` returns the descriptors of `on_event`.
///
/// # Attributes
///
/// - `#[stream_handler(crate = "...")]` - Absolute path of the framework crate, for
///   use through a re-exporting facade (default: `::kstreams_framework`)
/// - `#[header]` on a parameter - Bind it to the header named after it
/// - `#[header(alias = "...")]` - Bind it to the header with this exact name
/// - `#[header(convert_underscores = false)]` - Keep underscores in the key
///
/// Parameters without `#[header]` are described by name only; they bind to
/// the record, or to the marker implied by their type such as `FromHeader<T>`.
///
/// # Example
///
/// ```rust,ignore
/// #[stream_handler]
/// async fn on_event(#[header(convert_underscores = false)] trace_id: String) {}
///
/// assert_eq!(on_event::parameters().len(), 1);
/// ```
#[proc_macro_attribute]
pub fn stream_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = HandlerArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(item as ItemFn);

    match handler::expand_stream_handler(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
