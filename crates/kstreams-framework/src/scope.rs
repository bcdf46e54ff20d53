//! Per-record invocation scope.
//!
//! One [`InvocationScope`] is opened for each record handed to the executor.
//! It owns the live record and the results of every extraction run for that
//! record, and it is dropped when the invocation ends, whether the handler
//! ran or an extraction failed. Scopes are never shared between invocations,
//! so nothing in here needs a lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use kstreams_core::ConsumerRecord;
use tracing::trace;

use crate::argument::Argument;
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{Extract, Extractor};
use crate::plan::{Binding, PlannedParameter};

/// The ephemeral state of one handler invocation.
pub struct InvocationScope {
    record: Arc<ConsumerRecord>,
    /// Extraction results, one per distinct extractor.
    resolved: HashMap<Extractor, ExtractResult<Argument>>,
}

impl InvocationScope {
    /// Opens a scope around `record`.
    pub fn open(record: Arc<ConsumerRecord>) -> Self {
        trace!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            "Invocation scope opened"
        );
        Self {
            record,
            resolved: HashMap::new(),
        }
    }

    /// The live record of this invocation.
    pub fn record(&self) -> &Arc<ConsumerRecord> {
        &self.record
    }

    /// Runs every extractor not yet resolved in this scope.
    ///
    /// Distinct extractions have no ordering between them and are polled
    /// concurrently. Failures are cached like successes; they surface when
    /// the affected parameter is assembled.
    pub async fn resolve(&mut self, extractors: &[Extractor]) {
        let pending: Vec<&Extractor> = extractors
            .iter()
            .filter(|extractor| !self.resolved.contains_key(*extractor))
            .collect();

        let record = &*self.record;
        let results = join_all(pending.iter().map(|extractor| extractor.extract(record))).await;

        for (extractor, result) in pending.into_iter().zip(results) {
            self.resolved.insert(extractor.clone(), result);
        }
    }

    /// Produces the argument for one planned parameter.
    ///
    /// An absent value for an optional parameter becomes
    /// [`Argument::Missing`]; every other failure is returned unchanged.
    pub fn argument_for(&self, parameter: &PlannedParameter) -> ExtractResult<Argument> {
        match parameter.binding() {
            Binding::Record => Ok(Argument::Record(Arc::clone(&self.record))),
            Binding::Extractor(extractor) => match self.resolved.get(extractor) {
                Some(Ok(argument)) => Ok(argument.clone()),
                Some(Err(err)) if parameter.is_optional() && err.is_missing() => {
                    Ok(Argument::Missing)
                }
                Some(Err(err)) => Err(err.clone()),
                None => Err(ExtractError::custom(format!(
                    "extractor `{extractor}` was not resolved in this scope"
                ))),
            },
        }
    }
}

impl Drop for InvocationScope {
    fn drop(&mut self) {
        trace!(
            topic = %self.record.topic,
            partition = self.record.partition,
            offset = self.record.offset,
            "Invocation scope closed"
        );
    }
}

impl fmt::Debug for InvocationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationScope")
            .field("topic", &self.record.topic)
            .field("offset", &self.record.offset)
            .field("resolved", &self.resolved.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use kstreams_core::HeaderValue;

    use super::*;
    use crate::argument::FromHeader;
    use crate::handler::Handler;
    use crate::plan::{Param, PlanBuilder, ResolutionPlan};

    async fn handler(_a: FromHeader<String>, _b: Option<FromHeader<String>>) {}

    fn plan_for<H: Handler<T>, T>(_: &H, params: impl IntoIterator<Item = Param>) -> ResolutionPlan {
        PlanBuilder::new().build::<H, T>(params).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_and_assemble() {
        let plan = plan_for(&handler, [Param::new("present"), Param::new("absent")]);
        let record = Arc::new(ConsumerRecord::new("events").with_header("present", "yes"));

        let mut scope = InvocationScope::open(Arc::clone(&record));
        scope.resolve(plan.extractors()).await;

        let present = scope.argument_for(&plan.parameters()[0]).unwrap();
        assert!(matches!(present, Argument::Header(HeaderValue::Text(ref t)) if t == "yes"));

        let absent = scope.argument_for(&plan.parameters()[1]).unwrap();
        assert!(matches!(absent, Argument::Missing));

        assert!(Arc::ptr_eq(scope.record(), &record));
    }

    #[tokio::test]
    async fn test_required_missing_header_fails() {
        let plan = plan_for(&handler, [Param::new("present"), Param::new("absent")]);
        let record = Arc::new(ConsumerRecord::new("events"));

        let mut scope = InvocationScope::open(record);
        scope.resolve(plan.extractors()).await;

        let err = scope.argument_for(&plan.parameters()[0]).unwrap_err();
        assert_eq!(
            err,
            ExtractError::HeaderNotFound {
                key: "present".into()
            }
        );
    }

    #[tokio::test]
    async fn test_scope_releases_record_on_drop() {
        let plan = plan_for(&handler, [Param::new("present"), Param::new("absent")]);
        let record = Arc::new(ConsumerRecord::new("events").with_header("present", "yes"));

        {
            let mut scope = InvocationScope::open(Arc::clone(&record));
            scope.resolve(plan.extractors()).await;
            let _argument = scope.argument_for(&plan.parameters()[0]).unwrap();
            assert_eq!(Arc::strong_count(&record), 2);
        }

        assert_eq!(Arc::strong_count(&record), 1);
    }
}
