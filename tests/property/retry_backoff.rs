//! Property: the decorrelated-jitter delay sequence never leaves
//! `[seed, max]`, for any seed/max/draw sequence the configuration allows.

use proptest::prelude::*;
use resilience_retry::DecorrelatedJitter;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn delay_sequence_always_stays_within_seed_and_maximum(
        seed_ms in 1u64..1_000,
        max_extra_ms in 0u64..10_000,
        draws in prop::collection::vec(0.0f64..1.0, 1..50),
    ) {
        let seed = Duration::from_millis(seed_ms);
        let max = seed + Duration::from_millis(max_extra_ms);
        let mut jitter = DecorrelatedJitter::new(seed, max);

        for draw in draws {
            let delay = jitter.next_delay(draw);
            prop_assert!(delay >= seed, "delay {:?} below seed {:?}", delay, seed);
            prop_assert!(delay <= max, "delay {:?} above max {:?}", delay, max);
        }
    }

    #[test]
    fn a_zero_draw_always_collapses_to_the_seed(
        seed_ms in 1u64..1_000,
        max_extra_ms in 0u64..10_000,
    ) {
        let seed = Duration::from_millis(seed_ms);
        let max = seed + Duration::from_millis(max_extra_ms);
        let mut jitter = DecorrelatedJitter::new(seed, max);

        let delay = jitter.next_delay(0.0);
        prop_assert_eq!(delay, seed);
    }
}
