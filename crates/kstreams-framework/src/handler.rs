//! Handler trait for the kstreams framework.
//!
//! Handlers are plain async functions. [`Handler`] is implemented for every
//! function taking 0-16 parameters that implement [`FromArgument`], much like
//! Axum's handler system.
//!
//! The trait carries two things the rest of the framework needs:
//!
//! - [`Handler::parameter_types`] - the declared type of each positional
//!   parameter, read once by the plan builder;
//! - [`Handler::call`] - converts a resolved argument list and runs the
//!   function, per record.
//!
//! Parameter *names* are not visible at the type level; they come from the
//! descriptor list passed to the builder (see [`Param`](crate::plan::Param)
//! and the `#[stream_handler]` attribute).
//!
//! # Example
//!
//! ```rust,ignore
//! use kstreams_framework::{ConsumerRecord, FromHeader};
//!
//! // The raw record
//! async fn log_offset(record: ConsumerRecord) {
//!     println!("offset {}", record.offset);
//! }
//!
//! // A header, with the default marker implied by the type
//! async fn echo(event_type: FromHeader<String>) -> String {
//!     event_type.into_inner()
//! }
//! ```

use std::any::{TypeId, type_name};
use std::fmt;

use futures::future::BoxFuture;

use crate::argument::{Argument, FromArgument};
use crate::error::{ExtractError, ExtractResult};
use crate::marker::BindingMarker;

// ============================================================================
// ParameterType
// ============================================================================

/// Build-time description of one declared parameter type.
#[derive(Clone, Copy)]
pub struct ParameterType {
    type_id: TypeId,
    type_name: &'static str,
    implied_marker: fn() -> Option<BindingMarker>,
    optional: bool,
}

impl ParameterType {
    /// Describes the parameter type `T`.
    pub fn of<T: FromArgument>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            implied_marker: T::implied_marker,
            optional: T::is_optional(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The marker the type implies, see [`FromArgument::implied_marker`].
    pub fn implied_marker(&self) -> Option<BindingMarker> {
        (self.implied_marker)()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterType")
            .field("type_name", &self.type_name)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for record handlers.
///
/// # Blanket Implementation
///
/// Implemented for async functions (and cloneable closures returning futures)
/// that:
/// - take 0-16 parameters implementing [`FromArgument`];
/// - return any `Send + 'static` output.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The handler's return type.
    type Output: Send + 'static;

    /// Declared parameter types, in positional order.
    fn parameter_types() -> Vec<ParameterType>;

    /// Converts `arguments` (one per parameter, in order) and calls the
    /// handler.
    ///
    /// If any conversion fails the handler is not invoked.
    fn call(self, arguments: Vec<Argument>) -> BoxFuture<'static, ExtractResult<Self::Output>>;
}

fn next_argument(arguments: &mut std::vec::IntoIter<Argument>) -> ExtractResult<Argument> {
    arguments
        .next()
        .ok_or_else(|| ExtractError::custom("argument list shorter than the handler's parameters"))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: Send + 'static,
            $( $ty: FromArgument, )*
        {
            type Output = Res;

            fn parameter_types() -> Vec<ParameterType> {
                vec![$( ParameterType::of::<$ty>(), )*]
            }

            fn call(self, arguments: Vec<Argument>) -> BoxFuture<'static, ExtractResult<Res>> {
                Box::pin(async move {
                    let mut arguments = arguments.into_iter();
                    $(
                        let $ty = $ty::from_argument(next_argument(&mut arguments)?)?;
                    )*

                    Ok((self)($($ty,)*).await)
                })
            }
        }
    };
}

// Generate implementations for 0-16 parameters
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kstreams_core::{ConsumerRecord, HeaderValue};

    use super::*;
    use crate::argument::FromHeader;

    fn types_of<H: Handler<T>, T>(_: &H) -> Vec<ParameterType> {
        H::parameter_types()
    }

    async fn two_params(record: ConsumerRecord, event_type: FromHeader<String>) -> String {
        format!("{}:{}", record.topic, event_type.0)
    }

    #[test]
    fn test_parameter_types() {
        let types = types_of(&two_params);
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].type_id(), TypeId::of::<ConsumerRecord>());
        assert!(types[0].implied_marker().is_none());
        assert!(types[1].implied_marker().is_some());
        assert!(!types[1].is_optional());
    }

    #[tokio::test]
    async fn test_call_converts_in_order() {
        let arguments = vec![
            Argument::Record(Arc::new(ConsumerRecord::new("events"))),
            Argument::Header(HeaderValue::from("hello")),
        ];
        let output = Handler::call(two_params, arguments).await.unwrap();
        assert_eq!(output, "events:hello");
    }

    #[tokio::test]
    async fn test_failed_conversion_skips_body() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let handler = move |_value: String| {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        };

        let result =
            Handler::call(handler, vec![Argument::Header(HeaderValue::Bytes(vec![1]))]).await;

        assert!(matches!(result, Err(ExtractError::TypeMismatch { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_argument_list_is_an_error() {
        let result = Handler::call(two_params, Vec::new()).await;
        assert!(result.is_err());
    }
}
