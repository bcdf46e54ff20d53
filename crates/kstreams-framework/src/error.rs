//! Error types for the kstreams framework.
//!
//! Two families, matching the two phases of a handler's life:
//!
//! - [`BuildError`] is raised once, while a handler's resolution plan is
//!   built. It means the handler can never run.
//! - [`ExtractError`] is raised per record, when a value the handler needs
//!   cannot be produced from that record. The handler is not called.

use thiserror::Error;

/// Errors raised while building a resolution plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A parameter is neither a framework type nor bound to a marker.
    #[error(
        "parameter `{name}` of type `{type_name}` cannot be resolved: \
         it is not a framework type and carries no binding marker"
    )]
    Unsatisfiable {
        /// Declared parameter name.
        name: String,
        /// Declared parameter type.
        type_name: &'static str,
    },

    /// The descriptor list does not match the handler's arity.
    #[error("handler takes {declared} parameter(s) but {described} were described")]
    ArityMismatch {
        /// Number of parameters the handler function takes.
        declared: usize,
        /// Number of parameter descriptors supplied.
        described: usize,
    },

    /// Two descriptors use the same parameter name.
    #[error("parameter `{0}` is described more than once")]
    DuplicateParameter(String),
}

/// Result type for plan building.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while resolving a handler's arguments from a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No header with the lookup key exists on the record.
    #[error(
        "No header `{key}` found.\n\
         Check if your producer is sending the header.\n\
         Try making the parameter optional with `Option<T>`.\n\
         Or set `convert_underscores(false)` on the header marker."
    )]
    HeaderNotFound {
        /// The lookup key that matched nothing.
        key: String,
    },

    /// The resolved value cannot be handed to the declared parameter type.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared parameter type.
        expected: &'static str,
        /// What was actually resolved.
        got: &'static str,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Returns `true` if the error means "the value is absent", which an
    /// optional parameter may absorb.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::HeaderNotFound { .. })
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_not_found_message() {
        let message = ExtractError::HeaderNotFound {
            key: "event-type".into(),
        }
        .to_string();

        assert!(message.contains("`event-type`"));
        assert!(message.contains("producer"));
        assert!(message.contains("Option<T>"));
        assert!(message.contains("convert_underscores(false)"));
    }

    #[test]
    fn test_only_header_not_found_is_missing() {
        assert!(ExtractError::HeaderNotFound { key: "k".into() }.is_missing());
        assert!(!ExtractError::custom("boom").is_missing());
        assert!(
            !ExtractError::TypeMismatch {
                expected: "String",
                got: "bytes header",
            }
            .is_missing()
        );
    }
}
