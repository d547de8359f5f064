//! The per-invocation property bag threaded through every strategy.

use std::fmt;
use tokio_util::sync::CancellationToken;

/// The underlying HTTP method of the call being executed.
///
/// Used by the retry strategy's idempotency gate (`CanRetry` only retries
/// GETs on a retryable status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        write!(f, "{s}")
    }
}

/// A per-invocation context carrying the metadata every strategy needs to
/// select its own state (which circuit shard, which rate-limit bucket,
/// which metrics name) without the pipeline being generic over a request
/// type.
///
/// Acquired from and returned to an [`resilience_executor::ContextPool`]
/// by the executor on every call.
#[derive(Debug, Clone)]
pub struct ResilienceContext {
    /// `"<OperationPrefix>.<operationName>"`, used for metrics and logs.
    pub operation_key: String,
    /// Selects the token bucket within the endpoint's rate limiter.
    pub rate_limit_partition: String,
    /// Selects the circuit-breaker shard within the endpoint.
    pub resource: String,
    /// The underlying HTTP method, used by the retry idempotency gate.
    pub method: HttpMethod,
    /// The caller's cancellation signal.
    pub cancellation: CancellationToken,
}

impl ResilienceContext {
    /// Builds a fresh context. Prefer acquiring one from a
    /// `ContextPool` in the executor rather than calling this directly,
    /// except in tests.
    pub fn new(
        operation_key: impl Into<String>,
        rate_limit_partition: impl Into<String>,
        resource: impl Into<String>,
        method: HttpMethod,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            operation_key: operation_key.into(),
            rate_limit_partition: rate_limit_partition.into(),
            resource: resource.into(),
            method,
            cancellation,
        }
    }

    /// Resets this context in place so it can be reused by a pool,
    /// without reallocating the `String` buffers backing it.
    pub fn reset(
        &mut self,
        operation_key: impl Into<String>,
        rate_limit_partition: impl Into<String>,
        resource: impl Into<String>,
        method: HttpMethod,
        cancellation: CancellationToken,
    ) {
        self.operation_key.clear();
        self.operation_key.push_str(&operation_key.into());
        self.rate_limit_partition.clear();
        self.rate_limit_partition.push_str(&rate_limit_partition.into());
        self.resource.clear();
        self.resource.push_str(&resource.into());
        self.method = method;
        self.cancellation = cancellation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_reuses_allocations() {
        let mut ctx = ResilienceContext::new(
            "movies.get_movie",
            "tok-1",
            "get_movie",
            HttpMethod::Get,
            CancellationToken::new(),
        );
        ctx.reset(
            "users.get_user",
            "tok-2",
            "get_user",
            HttpMethod::Post,
            CancellationToken::new(),
        );
        assert_eq!(ctx.operation_key, "users.get_user");
        assert_eq!(ctx.method, HttpMethod::Post);
    }
}
