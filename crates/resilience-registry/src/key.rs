/// `(EndpointName, Resource, HandlesExecutionFaults)`, the full cache
/// key for the typed executor-facing entry (pipeline + fallback).
///
/// The underlying untyped [`crate::Pipeline`] (breaker, rate limiter,
/// timeout, retry) is cached only by `(endpoint, resource)`; it doesn't
/// vary with `handles_execution_faults`, which only selects which faults
/// the fallback wrapper is willing to catch. See `DESIGN.md` for the
/// rationale (the spec's single three-field `PipelineKey` is realised as
/// two cooperating cache layers rather than one).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub endpoint: String,
    pub resource: String,
    pub handles_execution_faults: bool,
}

impl PipelineKey {
    pub fn new(endpoint: impl Into<String>, resource: impl Into<String>, handles_execution_faults: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            resource: resource.into(),
            handles_execution_faults,
        }
    }
}

/// `(EndpointName, Resource)`, the untyped pipeline cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UntypedKey {
    pub endpoint: String,
    pub resource: String,
}

impl From<&PipelineKey> for UntypedKey {
    fn from(key: &PipelineKey) -> Self {
        Self {
            endpoint: key.endpoint.clone(),
            resource: key.resource.clone(),
        }
    }
}
