//! Resolution plans.
//!
//! A [`ResolutionPlan`] is compiled once per handler and says, for every
//! parameter, where its value comes from:
//!
//! - [`Binding::Record`] - the live record, supplied by the framework;
//! - [`Binding::Extractor`] - the result of running an extractor on the record.
//!
//! The plan is immutable once built and is shared, via `Arc`, by every
//! invocation of the handler.
//!
//! # Building
//!
//! [`PlanBuilder::build`] pairs the handler's declared parameter types (from
//! [`Handler::parameter_types`]) with a caller-supplied list of [`Param`]
//! descriptors, one per position. For each parameter, in order:
//!
//! 1. a declared type registered as a framework type binds to the record;
//! 2. otherwise the descriptor's marker, or the marker implied by the type,
//!    is materialized into an extractor;
//! 3. otherwise building fails with [`BuildError::Unsatisfiable`].
//!
//! Building never defers a problem to record time.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use kstreams_core::ConsumerRecord;
use tracing::debug;

use crate::error::{BuildError, BuildResult};
use crate::extractor::Extractor;
use crate::handler::{Handler, ParameterType};
use crate::marker::{BindingMarker, Marker};

// ============================================================================
// Param - parameter descriptors
// ============================================================================

/// Describes one handler parameter: its name and, optionally, its marker.
///
/// ```rust
/// use kstreams_framework::{Header, Param};
///
/// let params = [
///     Param::new("record"),
///     Param::header("event_type"),
///     Param::new("kind").marker(Header::new().alias("EventType")),
/// ];
/// assert_eq!(params[1].name(), "event_type");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    marker: Option<BindingMarker>,
}

impl Param {
    /// A parameter with no explicit marker.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: None,
        }
    }

    /// A parameter bound to the header named after it, default settings.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name).marker(crate::marker::Header::new())
    }

    /// Attaches a marker.
    pub fn marker(mut self, marker: impl Into<BindingMarker>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit marker, if one was attached.
    pub fn binding_marker(&self) -> Option<&BindingMarker> {
        self.marker.as_ref()
    }
}

// ============================================================================
// ResolutionPlan
// ============================================================================

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The live record.
    Record,
    /// The output of an extractor run against the record.
    Extractor(Extractor),
}

/// One parameter of a built plan.
#[derive(Debug, Clone)]
pub struct PlannedParameter {
    name: String,
    type_name: &'static str,
    optional: bool,
    binding: Binding,
}

impl PlannedParameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether an absent value resolves to `None` instead of failing.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

/// The immutable, per-handler argument resolution plan.
#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    parameters: Vec<PlannedParameter>,
    extractors: Vec<Extractor>,
}

impl ResolutionPlan {
    /// Planned parameters, in positional order.
    pub fn parameters(&self) -> &[PlannedParameter] {
        &self.parameters
    }

    /// Looks a parameter's binding up by name.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.binding)
    }

    /// Distinct extractors used by the plan, in first-use order.
    ///
    /// Parameters requesting an identical extraction share one entry.
    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

// ============================================================================
// PlanBuilder
// ============================================================================

/// Compiles handlers into [`ResolutionPlan`]s.
///
/// The builder knows which declared parameter types the framework supplies
/// itself; by default those are `ConsumerRecord` and `Arc<ConsumerRecord>`.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    framework_types: Vec<TypeId>,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self {
            framework_types: vec![
                TypeId::of::<ConsumerRecord>(),
                TypeId::of::<Arc<ConsumerRecord>>(),
            ],
        }
    }
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if parameters declared as `type_id` receive the record.
    pub fn is_framework_type(&self, type_id: TypeId) -> bool {
        self.framework_types.contains(&type_id)
    }

    /// Builds the plan for handler `H` from its parameter descriptors.
    pub fn build<H, T>(&self, params: impl IntoIterator<Item = Param>) -> BuildResult<ResolutionPlan>
    where
        H: Handler<T>,
    {
        let plan = self.build_from_types(&H::parameter_types(), params.into_iter().collect())?;

        debug!(
            handler = std::any::type_name::<H>(),
            parameters = plan.len(),
            extractors = plan.extractors().len(),
            "Resolution plan built"
        );

        Ok(plan)
    }

    /// Builds a plan from explicit parameter types and descriptors.
    pub fn build_from_types(
        &self,
        types: &[ParameterType],
        params: Vec<Param>,
    ) -> BuildResult<ResolutionPlan> {
        if types.len() != params.len() {
            return Err(BuildError::ArityMismatch {
                declared: types.len(),
                described: params.len(),
            });
        }

        let mut names = HashSet::new();
        for param in &params {
            if !names.insert(param.name.as_str()) {
                return Err(BuildError::DuplicateParameter(param.name.clone()));
            }
        }

        let mut parameters = Vec::with_capacity(params.len());
        let mut extractors: Vec<Extractor> = Vec::new();

        for (ty, param) in types.iter().zip(params) {
            let binding = self.bind(ty, &param)?;

            if let Binding::Extractor(extractor) = &binding {
                if !extractors.contains(extractor) {
                    extractors.push(extractor.clone());
                }
            }

            parameters.push(PlannedParameter {
                name: param.name,
                type_name: ty.type_name(),
                optional: ty.is_optional(),
                binding,
            });
        }

        Ok(ResolutionPlan {
            parameters,
            extractors,
        })
    }

    fn bind(&self, ty: &ParameterType, param: &Param) -> BuildResult<Binding> {
        if self.is_framework_type(ty.type_id()) {
            return Ok(Binding::Record);
        }

        let marker = param.binding_marker().cloned().or_else(|| ty.implied_marker());
        match marker {
            Some(marker) => Ok(Binding::Extractor(marker.register_parameter(&param.name))),
            None => Err(BuildError::Unsatisfiable {
                name: param.name.clone(),
                type_name: ty.type_name(),
            }),
        }
    }
}
