//! Pure predicates deciding whether a fault is retryable or circuit-breakable.
//!
//! Both predicates are plain functions over [`PipelineFault`], no state,
//! no I/O, so the circuit breaker and retry strategies can share the exact
//! same classification rules without depending on each other.

use resilience_core::{ConnectionFault, HttpMethod, OperationFault, PipelineFault};

/// `true` iff the fault should count as a failure toward the circuit
/// breaker's sliding window.
///
/// A `RateLimitRejected` fault is deliberately excluded here for clarity,
/// but callers should not rely on this function for that invariant: the
/// circuit breaker strategy itself short-circuits before ever calling
/// this classifier for a rate-limit rejection (Invariant 4: rate-limit
/// rejections are never recorded as a breaker outcome at all, not even
/// as a success).
pub fn can_circuit_break(fault: &PipelineFault) -> bool {
    match fault {
        PipelineFault::TimeoutRejected => true,
        PipelineFault::RateLimitRejected
        | PipelineFault::BrokenCircuit
        | PipelineFault::IsolatedCircuit => false,
        PipelineFault::Operation(op) => match op {
            OperationFault::Api { status, .. } => *status >= 500 || *status == 408,
            OperationFault::Connection(_) => true,
            OperationFault::Cancelled { by_caller } => !by_caller,
            OperationFault::Unclassified(_) => false,
        },
    }
}

/// `true` iff the fault should trigger another retry attempt.
///
/// The status-based branch is gated by the idempotency check (`method ==
/// GET`); the cancellation branch is not, since a cancelled-but-not-by-
/// caller signal means the pipeline itself aborted the attempt (e.g. a
/// prior layer timed it out) rather than the request having side effects
/// the server observed.
pub fn can_retry(fault: &PipelineFault, method: HttpMethod) -> bool {
    match fault {
        PipelineFault::Operation(OperationFault::Api { status, .. }) => {
            method == HttpMethod::Get && matches!(status, 408 | 502 | 503 | 504)
        }
        PipelineFault::Operation(OperationFault::Cancelled { by_caller }) => !by_caller,
        _ => false,
    }
}

/// Recognises the transport-level faults classified as "connection
/// faults" by the source system.
///
/// `os_error_code` carries the platform error code observed on the
/// underlying I/O error, if any (the source recognises Windows'
/// `WSAHOST_NOT_FOUND` = 12007 and the native `-2147012889` HRESULT
/// surfaced by `HttpClient` as host-not-found conditions).
pub fn classify_connection_fault(
    message: &str,
    os_error_code: Option<i64>,
) -> Option<ConnectionFault> {
    let lower = message.to_ascii_lowercase();

    if matches!(os_error_code, Some(12007) | Some(-2147012889)) {
        return Some(ConnectionFault::HostNotFound);
    }
    if lower.contains("host not found") || lower.contains("name or service not known") {
        return Some(ConnectionFault::HostNotFound);
    }
    if lower.contains("connection refused") {
        return Some(ConnectionFault::Refused);
    }
    if lower.contains("the response ended prematurely") {
        return Some(ConnectionFault::PrematureEof);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> PipelineFault {
        PipelineFault::Operation(OperationFault::Api {
            status,
            method: HttpMethod::Get,
            uri: "https://upstream/x".into(),
        })
    }

    #[test]
    fn circuit_break_covers_5xx_and_408() {
        assert!(can_circuit_break(&api(500)));
        assert!(can_circuit_break(&api(503)));
        assert!(can_circuit_break(&api(408)));
        assert!(!can_circuit_break(&api(404)));
        assert!(!can_circuit_break(&api(400)));
    }

    #[test]
    fn circuit_break_covers_connection_faults_and_timeouts() {
        assert!(can_circuit_break(&PipelineFault::Operation(
            OperationFault::Connection(ConnectionFault::Refused)
        )));
        assert!(can_circuit_break(&PipelineFault::TimeoutRejected));
    }

    #[test]
    fn circuit_break_ignores_rate_limit_and_admin_faults() {
        assert!(!can_circuit_break(&PipelineFault::RateLimitRejected));
        assert!(!can_circuit_break(&PipelineFault::BrokenCircuit));
        assert!(!can_circuit_break(&PipelineFault::IsolatedCircuit));
    }

    #[test]
    fn circuit_break_distinguishes_caller_cancellation() {
        let by_caller = PipelineFault::Operation(OperationFault::Cancelled { by_caller: true });
        let internal = PipelineFault::Operation(OperationFault::Cancelled { by_caller: false });
        assert!(!can_circuit_break(&by_caller));
        assert!(can_circuit_break(&internal));
    }

    #[test]
    fn retry_requires_get_for_status_based_faults() {
        let get_fault = PipelineFault::Operation(OperationFault::Api {
            status: 503,
            method: HttpMethod::Get,
            uri: "u".into(),
        });
        assert!(can_retry(&get_fault, HttpMethod::Get));
        assert!(!can_retry(&get_fault, HttpMethod::Post));
    }

    #[test]
    fn retry_ignores_non_retryable_statuses() {
        assert!(!can_retry(&api(404), HttpMethod::Get));
        assert!(!can_retry(&api(500), HttpMethod::Get));
    }

    #[test]
    fn retry_allows_cancellation_regardless_of_method() {
        let internal = PipelineFault::Operation(OperationFault::Cancelled { by_caller: false });
        assert!(can_retry(&internal, HttpMethod::Post));
        let by_caller = PipelineFault::Operation(OperationFault::Cancelled { by_caller: true });
        assert!(!can_retry(&by_caller, HttpMethod::Get));
    }

    #[test]
    fn retry_never_triggers_on_infrastructure_faults() {
        assert!(!can_retry(&PipelineFault::BrokenCircuit, HttpMethod::Get));
        assert!(!can_retry(&PipelineFault::TimeoutRejected, HttpMethod::Get));
        assert!(!can_retry(&PipelineFault::RateLimitRejected, HttpMethod::Get));
    }

    #[test]
    fn connection_fault_detection_recognises_os_codes() {
        assert_eq!(
            classify_connection_fault("boom", Some(12007)),
            Some(ConnectionFault::HostNotFound)
        );
        assert_eq!(
            classify_connection_fault("boom", Some(-2147012889)),
            Some(ConnectionFault::HostNotFound)
        );
    }

    #[test]
    fn connection_fault_detection_recognises_messages() {
        assert_eq!(
            classify_connection_fault("Connection refused (os error 111)", None),
            Some(ConnectionFault::Refused)
        );
        assert_eq!(
            classify_connection_fault("The response ended prematurely.", None),
            Some(ConnectionFault::PrematureEof)
        );
        assert_eq!(classify_connection_fault("totally fine", None), None);
    }
}
