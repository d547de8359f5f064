//! Property: given `RateLimit = R`, at most `R` admissions succeed per
//! partition before the bucket refills, and distinct partitions never
//! share a budget (testable property 3 / Invariant from `SPEC_FULL.md`
//! §4.2).

use proptest::prelude::*;
use resilience_core::{HttpMethod, ResilienceContext};
use resilience_ratelimiter::{RateLimiterConfig, RateLimiterStrategy};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn ctx(partition: &str) -> ResilienceContext {
    ResilienceContext::new("movies.get", partition, "get_movie", HttpMethod::Get, CancellationToken::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// An hour-long period makes refill-during-the-test negligible, so a
    /// run of `attempts` back-to-back acquisitions should admit exactly
    /// the first `rate_limit` of them.
    #[test]
    fn exactly_rate_limit_admissions_succeed_per_partition(
        rate_limit in 1u32..20,
        extra_attempts in 0u32..50,
    ) {
        let strategy = RateLimiterStrategy::new(RateLimiterConfig::new(rate_limit, Duration::from_secs(3600), "movies"));
        let context = ctx("tenant-a");

        let mut admitted = 0u32;
        let mut rejected = 0u32;
        for _ in 0..(rate_limit + extra_attempts) {
            match strategy.try_acquire(&context) {
                Ok(()) => admitted += 1,
                Err(_) => rejected += 1,
            }
        }

        prop_assert_eq!(admitted, rate_limit);
        prop_assert_eq!(rejected, extra_attempts);
    }

    /// Exhausting one partition's budget never affects another partition's.
    #[test]
    fn partitions_never_share_a_budget(
        rate_limit in 1u32..10,
    ) {
        let strategy = RateLimiterStrategy::new(RateLimiterConfig::new(rate_limit, Duration::from_secs(3600), "movies"));
        let a = ctx("tenant-a");
        let b = ctx("tenant-b");

        for _ in 0..rate_limit {
            prop_assert!(strategy.try_acquire(&a).is_ok());
        }
        prop_assert!(strategy.try_acquire(&a).is_err());

        for _ in 0..rate_limit {
            prop_assert!(strategy.try_acquire(&b).is_ok());
        }
        prop_assert!(strategy.try_acquire(&b).is_err());
    }
}
