//! Resolved arguments and the conversion into handler parameter types.
//!
//! The executor resolves every parameter to an untyped [`Argument`], then
//! converts each one into the handler's declared parameter type through
//! [`FromArgument`]. Conversions only unwrap; nothing is parsed.
//!
//! | Parameter type          | Binding              | Accepts                      |
//! |-------------------------|----------------------|------------------------------|
//! | `ConsumerRecord`        | framework value      | the live record (cloned)     |
//! | `Arc<ConsumerRecord>`   | framework value      | the live record (shared)     |
//! | `HeaderValue`           | marker               | any header value             |
//! | `String`                | marker               | text header values           |
//! | `Vec<u8>`               | marker               | byte header values           |
//! | `Option<T>`             | as `T`               | `None` when the header is absent |
//! | `FromHeader<T>`         | implied header marker| as `T`                       |

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use kstreams_core::{ConsumerRecord, HeaderValue};

use crate::error::{ExtractError, ExtractResult};
use crate::marker::{BindingMarker, Header};

/// A resolved, not yet typed, handler argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// The live record, supplied by the framework.
    Record(Arc<ConsumerRecord>),
    /// A header value produced by a header extractor.
    Header(HeaderValue),
    /// The value is absent and the parameter is optional.
    Missing,
}

impl Argument {
    /// Short description used in type-mismatch diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Record(_) => "consumer record",
            Self::Header(HeaderValue::Text(_)) => "text header",
            Self::Header(HeaderValue::Bytes(_)) => "bytes header",
            Self::Missing => "missing value",
        }
    }

    fn mismatch<T>(self) -> ExtractError {
        ExtractError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            got: self.describe(),
        }
    }
}

/// A type that can be used as a handler parameter.
///
/// The two associated functions with defaults describe the type to the plan
/// builder; [`from_argument`](Self::from_argument) runs per record.
pub trait FromArgument: Sized + Send + 'static {
    /// A marker implied by the type itself, used when the parameter's
    /// descriptor carries none.
    fn implied_marker() -> Option<BindingMarker> {
        None
    }

    /// Whether an absent value resolves to [`Argument::Missing`] instead of
    /// failing the invocation.
    fn is_optional() -> bool {
        false
    }

    /// Converts the resolved argument into this type.
    fn from_argument(argument: Argument) -> ExtractResult<Self>;
}

impl FromArgument for Arc<ConsumerRecord> {
    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        match argument {
            Argument::Record(record) => Ok(record),
            other => Err(other.mismatch::<Self>()),
        }
    }
}

impl FromArgument for ConsumerRecord {
    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        Arc::<ConsumerRecord>::from_argument(argument).map(Arc::unwrap_or_clone)
    }
}

impl FromArgument for HeaderValue {
    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        match argument {
            Argument::Header(value) => Ok(value),
            other => Err(other.mismatch::<Self>()),
        }
    }
}

impl FromArgument for String {
    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        match argument {
            Argument::Header(HeaderValue::Text(text)) => Ok(text),
            other => Err(other.mismatch::<Self>()),
        }
    }
}

impl FromArgument for Vec<u8> {
    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        match argument {
            Argument::Header(HeaderValue::Bytes(bytes)) => Ok(bytes),
            other => Err(other.mismatch::<Self>()),
        }
    }
}

/// `Option<T>` turns an absent header into `None`.
impl<T: FromArgument> FromArgument for Option<T> {
    fn implied_marker() -> Option<BindingMarker> {
        T::implied_marker()
    }

    fn is_optional() -> bool {
        true
    }

    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        match argument {
            Argument::Missing => Ok(None),
            other => T::from_argument(other).map(Some),
        }
    }
}

// ============================================================================
// FromHeader
// ============================================================================

/// Binds a parameter to the header named after it, with default settings.
///
/// Equivalent to declaring the parameter as `T` and attaching
/// [`Header::new()`] to its descriptor.
///
/// ```rust,ignore
/// async fn on_event(event_type: FromHeader<String>) -> String {
///     event_type.into_inner()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromHeader<T>(pub T);

impl<T> FromHeader<T> {
    /// Unwraps the header value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for FromHeader<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for FromHeader<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: FromArgument> FromArgument for FromHeader<T> {
    fn implied_marker() -> Option<BindingMarker> {
        Some(Header::new().into())
    }

    fn is_optional() -> bool {
        T::is_optional()
    }

    fn from_argument(argument: Argument) -> ExtractResult<Self> {
        T::from_argument(argument).map(FromHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversions() {
        let record = Arc::new(ConsumerRecord::new("events"));

        let shared = Arc::<ConsumerRecord>::from_argument(Argument::Record(record.clone())).unwrap();
        assert!(Arc::ptr_eq(&shared, &record));

        let owned = ConsumerRecord::from_argument(Argument::Record(record)).unwrap();
        assert_eq!(owned.topic, "events");
    }

    #[test]
    fn test_string_accepts_text_only() {
        let text = String::from_argument(Argument::Header("hello".into())).unwrap();
        assert_eq!(text, "hello");

        let err = String::from_argument(Argument::Header(b"hi".to_vec().into())).unwrap_err();
        assert_eq!(
            err,
            ExtractError::TypeMismatch {
                expected: "alloc::string::String",
                got: "bytes header",
            }
        );
    }

    #[test]
    fn test_bytes_accept_bytes_only() {
        let bytes = Vec::<u8>::from_argument(Argument::Header(b"hi".to_vec().into())).unwrap();
        assert_eq!(bytes, b"hi");
        assert!(Vec::<u8>::from_argument(Argument::Header("hi".into())).is_err());
    }

    #[test]
    fn test_option_absorbs_missing() {
        assert_eq!(Option::<String>::from_argument(Argument::Missing).unwrap(), None);
        assert_eq!(
            Option::<String>::from_argument(Argument::Header("x".into())).unwrap(),
            Some("x".to_string())
        );
        assert!(Option::<String>::is_optional());
        assert!(!String::is_optional());
    }

    #[test]
    fn test_from_header_implies_marker() {
        assert_eq!(
            FromHeader::<String>::implied_marker(),
            Some(BindingMarker::Header(Header::new()))
        );
        assert_eq!(Option::<FromHeader<String>>::implied_marker(), FromHeader::<String>::implied_marker());
        assert!(FromHeader::<Option<String>>::is_optional());
        assert_eq!(String::implied_marker(), None);

        let value = FromHeader::<String>::from_argument(Argument::Header("hello".into())).unwrap();
        assert_eq!(*value, "hello");
    }
}
