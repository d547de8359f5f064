//! Property: whatever minimum-calls/failure-rate threshold a circuit is
//! configured with, it opens once that many calls have been observed and
//! the failure share reaches the threshold, and not before (testable
//! property 4 from `SPEC_FULL.md` §8).

use proptest::prelude::*;
use resilience_circuitbreaker::{CircuitBreakerConfigBuilder, CircuitBreakerStrategy, CircuitState};
use resilience_core::{HttpMethod, OperationFault, PipelineFault};
use std::time::Duration;

fn server_fault() -> PipelineFault {
    PipelineFault::Operation(OperationFault::Api {
        status: 503,
        method: HttpMethod::Get,
        uri: "https://upstream".into(),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Feeding exactly `minimum_calls` outcomes whose failure share sits
    /// strictly above the threshold always opens the circuit; feeding the
    /// same count with a share strictly below never does.
    #[test]
    fn opens_iff_failure_share_crosses_the_threshold(
        minimum_calls in 4u32..20,
        failures in 0u32..20,
    ) {
        let failures = failures.min(minimum_calls);
        let breaker = CircuitBreakerStrategy::new(
            CircuitBreakerConfigBuilder::new("movies")
                .sliding_window_count_based(minimum_calls)
                .minimum_number_of_calls(minimum_calls)
                .failure_rate_threshold(0.5)
                .wait_duration_in_open(Duration::from_secs(3600))
                .permitted_calls_in_half_open(1)
                .build(),
        );

        let failure_share = failures as f64 / minimum_calls as f64;

        for i in 0..minimum_calls {
            breaker.try_acquire().unwrap();
            if i < failures {
                breaker.on_outcome::<()>(&Err(server_fault()), Duration::ZERO);
            } else {
                breaker.on_outcome::<()>(&Ok(()), Duration::ZERO);
            }
        }

        if failure_share >= 0.5 {
            prop_assert_eq!(breaker.current_state(), CircuitState::Open);
        } else {
            prop_assert_eq!(breaker.current_state(), CircuitState::Closed);
        }
    }

    /// Fewer than `minimum_calls` outcomes never trip the breaker, no
    /// matter how many of them failed.
    #[test]
    fn stays_closed_below_the_minimum_call_count(
        minimum_calls in 4u32..20,
        observed in 0u32..19,
    ) {
        let observed = observed.min(minimum_calls - 1);
        let breaker = CircuitBreakerStrategy::new(
            CircuitBreakerConfigBuilder::new("movies")
                .sliding_window_count_based(minimum_calls)
                .minimum_number_of_calls(minimum_calls)
                .failure_rate_threshold(0.1)
                .wait_duration_in_open(Duration::from_secs(3600))
                .permitted_calls_in_half_open(1)
                .build(),
        );

        for _ in 0..observed {
            breaker.try_acquire().unwrap();
            breaker.on_outcome::<()>(&Err(server_fault()), Duration::ZERO);
        }

        prop_assert_eq!(breaker.current_state(), CircuitState::Closed);
    }
}
