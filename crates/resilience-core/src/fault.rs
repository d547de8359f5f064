//! The closed fault taxonomy that flows through every strategy.
//!
//! Every strategy in the pipeline speaks `Result<T, PipelineFault>`. An
//! `OperationFault` is what the caller-supplied action itself can raise;
//! the remaining `PipelineFault` variants are raised by the strategies
//! wrapping that action.

use std::fmt;

/// A fault raised by the caller-supplied action, before any pipeline
/// strategy has had a chance to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationFault {
    /// The upstream returned a non-success HTTP response.
    Api {
        status: u16,
        method: crate::context::HttpMethod,
        uri: String,
    },
    /// A transport-level failure before a response was received.
    Connection(ConnectionFault),
    /// The operation observed cancellation.
    ///
    /// `by_caller` distinguishes a signal that originated from the
    /// caller's own `CancellationToken` from one injected internally
    /// (for example by a nested timeout the action itself imposed).
    Cancelled { by_caller: bool },
    /// Anything else; surfaces verbatim and is never retried, never
    /// circuit-broken, and never falls back.
    Unclassified(String),
}

impl fmt::Display for OperationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationFault::Api { status, method, uri } => {
                write!(f, "{method} {uri} returned status {status}")
            }
            OperationFault::Connection(c) => write!(f, "connection fault: {c}"),
            OperationFault::Cancelled { by_caller: true } => write!(f, "cancelled by caller"),
            OperationFault::Cancelled { by_caller: false } => write!(f, "operation cancelled"),
            OperationFault::Unclassified(msg) => write!(f, "unclassified fault: {msg}"),
        }
    }
}

/// Transport-level failures recognised before a response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFault {
    /// The peer actively refused the connection.
    Refused,
    /// DNS resolution failed to find the host. Covers the source's
    /// OS-specific codes (Windows WSAHOST_NOT_FOUND = 12007, and the
    /// native HRESULT -2147012889 seen in its HttpClient failures).
    HostNotFound,
    /// The connection was closed mid-response: "The response ended
    /// prematurely."
    PrematureEof,
}

impl fmt::Display for ConnectionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionFault::Refused => write!(f, "connection refused"),
            ConnectionFault::HostNotFound => write!(f, "host not found"),
            ConnectionFault::PrematureEof => write!(f, "the response ended prematurely"),
        }
    }
}

/// The fault surfaced by the pipeline as a whole.
///
/// Every strategy either forwards an inner `PipelineFault` unchanged or
/// raises one of its own admission-control variants
/// (`RateLimitRejected`, `BrokenCircuit`, `IsolatedCircuit`,
/// `TimeoutRejected`).
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineFault {
    /// The caller-supplied action itself failed.
    Operation(OperationFault),
    /// The rate limiter had no token available for this partition.
    RateLimitRejected,
    /// The circuit breaker is open.
    BrokenCircuit,
    /// The circuit breaker has been administratively isolated.
    IsolatedCircuit,
    /// The timeout strategy's deadline elapsed before the action completed.
    TimeoutRejected,
}

impl fmt::Display for PipelineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineFault::Operation(op) => write!(f, "{op}"),
            PipelineFault::RateLimitRejected => write!(f, "rate limit rejected"),
            PipelineFault::BrokenCircuit => write!(f, "circuit breaker is open"),
            PipelineFault::IsolatedCircuit => write!(f, "circuit breaker is isolated"),
            PipelineFault::TimeoutRejected => write!(f, "pipeline timeout elapsed"),
        }
    }
}

impl std::error::Error for PipelineFault {}

impl PipelineFault {
    /// Returns `true` if this is an admission-control fault raised by a
    /// strategy, rather than one that originated in the action itself.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, PipelineFault::Operation(_))
    }
}
