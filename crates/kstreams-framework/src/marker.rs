//! Binding markers.
//!
//! A marker is the declarative half of a parameter binding: it says *how* a
//! parameter's value is obtained ("from a header, looked up by this key")
//! without touching any record. At build time the plan builder hands each
//! marked parameter's name to [`Marker::register_parameter`], which
//! materializes the marker into an [`Extractor`](crate::extractor::Extractor).
//!
//! # Example
//!
//! ```rust
//! use kstreams_framework::{Header, Marker};
//!
//! // Default settings: underscores become hyphens.
//! assert_eq!(Header::new().register_parameter("event_type").key(), "event-type");
//!
//! // Literal parameter name.
//! let literal = Header::new().convert_underscores(false);
//! assert_eq!(literal.register_parameter("event_type").key(), "event_type");
//!
//! // Alias wins over everything else.
//! let aliased = Header::new().alias("EventType");
//! assert_eq!(aliased.register_parameter("event_type").key(), "EventType");
//! ```

use crate::extractor::{Extract, Extractor, HeaderExtractor};

/// Turns a parameter name into an extraction recipe.
pub trait Marker {
    /// The extractor this marker produces.
    type Extractor: Extract;

    /// Materializes this marker for the parameter called `name`.
    fn register_parameter(&self, name: &str) -> Self::Extractor;
}

// ============================================================================
// Header
// ============================================================================

/// Binds a parameter to a record header.
///
/// The lookup key is, in order of precedence:
///
/// 1. the [`alias`](Self::alias), if set;
/// 2. the parameter name with `_` replaced by `-`, if
///    [`convert_underscores`](Self::convert_underscores) is on (the default);
/// 3. the parameter name verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    alias: Option<String>,
    convert_underscores: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alias: None,
            convert_underscores: true,
        }
    }
}

impl Header {
    /// Creates a header marker with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks the header up by `alias` instead of the parameter name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Controls underscore-to-hyphen conversion of the parameter name.
    ///
    /// Has no effect when an alias is set.
    pub fn convert_underscores(mut self, enabled: bool) -> Self {
        self.convert_underscores = enabled;
        self
    }

    /// Computes the header key a parameter called `name` is looked up by.
    pub fn lookup_key(&self, name: &str) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None if self.convert_underscores => name.replace('_', "-"),
            None => name.to_string(),
        }
    }
}

impl Marker for Header {
    type Extractor = HeaderExtractor;

    fn register_parameter(&self, name: &str) -> HeaderExtractor {
        HeaderExtractor::new(self.lookup_key(name))
    }
}

// ============================================================================
// BindingMarker
// ============================================================================

/// Any marker the plan builder understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingMarker {
    /// Bind to a record header.
    Header(Header),
}

impl Marker for BindingMarker {
    type Extractor = Extractor;

    fn register_parameter(&self, name: &str) -> Extractor {
        match self {
            Self::Header(header) => Extractor::Header(header.register_parameter(name)),
        }
    }
}

impl From<Header> for BindingMarker {
    fn from(header: Header) -> Self {
        Self::Header(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_converts_underscores() {
        let extractor = Header::new().register_parameter("event_type");
        assert_eq!(extractor.key(), "event-type");
    }

    #[test]
    fn test_conversion_disabled_keeps_name() {
        let extractor = Header::new()
            .convert_underscores(false)
            .register_parameter("event_type");
        assert_eq!(extractor.key(), "event_type");
    }

    #[test]
    fn test_alias_overrides_name_and_conversion() {
        let extractor = Header::new().alias("EventType").register_parameter("event_type");
        assert_eq!(extractor.key(), "EventType");

        let extractor = Header::new()
            .alias("Event_Type")
            .convert_underscores(true)
            .register_parameter("event_type");
        assert_eq!(extractor.key(), "Event_Type");
    }

    #[test]
    fn test_binding_marker_dispatches_to_header() {
        let marker = BindingMarker::from(Header::new());
        assert_eq!(
            marker.register_parameter("trace_id"),
            Extractor::Header(HeaderExtractor::new("trace-id"))
        );
    }
}
