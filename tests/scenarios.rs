//! End-to-end scenarios run against the full `Executor` + `Registry` stack,
//! one per row of the literal table in `SPEC_FULL.md` §8.
//!
//! Unlike the per-crate unit tests (which exercise one strategy, or a bare
//! `Pipeline` assembled by hand), these go through `Executor::execute` the
//! way a host handler would: config comes from a `StaticConfigSource`, the
//! pipeline is resolved from the registry, and faults are observed exactly
//! as a caller would see them.

use resilience_core::{HttpMethod, OperationFault, PipelineFault};
use resilience_executor::{ExecuteOptions, Executor, FallbackOptions};
use resilience_registry::{EndpointConfig, Registry, StaticConfigSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn executor_for(config: EndpointConfig) -> Executor<StaticConfigSource> {
    let name = config.name.clone();
    let source = StaticConfigSource::new().with_endpoint(config);
    Executor::new(name, Arc::new(Registry::new(source)))
}

fn api_fault(status: u16) -> PipelineFault {
    PipelineFault::Operation(OperationFault::Api {
        status,
        method: HttpMethod::Get,
        uri: "https://upstream/movies/1".into(),
    })
}

/// S1: `Retries=2, Timeout=1s`, action always fails with 502 → 3
/// invocations, surfaces the `DependencyFault(502)`.
#[tokio::test]
async fn s1_exhausted_retries_surface_the_dependency_fault() {
    let executor = executor_for(EndpointConfig::new("movies").retries(2).timeout(Duration::from_secs(1)));
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(api_fault(502))
                }
            },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result, Err(api_fault(502)));
}

/// S2: `RateLimit=1, RateLimitPeriod=60s`; two partitions "tok-1"/"tok-2".
/// call tok-1, call tok-1, call tok-2 → OK, RateLimitRejected, OK.
#[tokio::test]
async fn s2_rate_limit_partitions_do_not_interfere() {
    let executor = executor_for(EndpointConfig::new("movies").rate_limit(1, Duration::from_secs(60)));

    let ok = executor
        .execute(
            "tok-1",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(ok, Ok(1));

    let rejected = executor
        .execute(
            "tok-1",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(rejected, Err(PipelineFault::RateLimitRejected));

    let ok_other_partition = executor
        .execute(
            "tok-2",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(ok_other_partition, Ok(1));
}

/// S3: `FailureMinimumThroughput=2, FailureThreshold=0.5,
/// FailureBreakDuration=60s`; action always throws 500. call, call, call
/// → ApiFault, ApiFault, BrokenCircuit.
#[tokio::test]
async fn s3_breaker_opens_on_the_third_call() {
    let executor = executor_for(
        EndpointConfig::new("movies")
            .failure_minimum_throughput(2)
            .failure_threshold(0.5)
            .failure_break_duration(Duration::from_secs(60)),
    );

    for _ in 0..2 {
        let result = executor
            .execute(
                "tenant-a",
                "get_movie",
                HttpMethod::Get,
                || async { Err::<u32, _>(api_fault(500)) },
                ExecuteOptions::new(),
                CancellationToken::new(),
            )
            .await;
        assert_eq!(result, Err(api_fault(500)));
    }

    let third = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(third, Err(PipelineFault::BrokenCircuit));
}

/// S4: `Isolate=true` → every call fails `IsolatedCircuit`; after
/// `Clear()` with `Isolate=false` the action runs normally again.
#[tokio::test]
async fn s4_isolation_blocks_until_clear_with_isolate_false() {
    let source = StaticConfigSource::new().with_endpoint(EndpointConfig::new("movies").isolate(true));
    let registry = Arc::new(Registry::new(source));
    let executor = Executor::new("movies", Arc::clone(&registry));

    let isolated = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(isolated, Err(PipelineFault::IsolatedCircuit));

    // A config reload that flips `Isolate` to `false`, followed by the
    // registry's `Clear()`, is how a host un-isolates an endpoint.
    registry.clear();
    let after_clear = Executor::new(
        "movies",
        Arc::new(Registry::new(StaticConfigSource::new().with_endpoint(EndpointConfig::new("movies").isolate(false)))),
    );

    let result = after_clear
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(result, Ok(1));
}

/// S5: `Timeout=1s`, action delays 5s → `TimeoutRejected` fires at
/// roughly `Timeout + 1s` (the pessimistic slack the registry adds; see
/// `resilience-registry`'s `TIMEOUT_SLACK`), not after the full 5s delay.
#[tokio::test]
async fn s5_pessimistic_timeout_fires_before_the_action_completes() {
    let executor = executor_for(EndpointConfig::new("movies").timeout(Duration::from_secs(1)));

    let started = tokio::time::Instant::now();
    let result = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, PipelineFault>(1u32)
            },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(PipelineFault::TimeoutRejected));
    assert!(elapsed < Duration::from_secs(3), "expected the ~2s deadline, took {elapsed:?}");
}

/// S6: two resources `A`/`B` on the same endpoint; `A` has an open
/// circuit. call A, call B → BrokenCircuit, OK.
#[tokio::test]
async fn s6_breaker_shards_do_not_leak_across_resources() {
    let executor = executor_for(
        EndpointConfig::new("movies").failure_minimum_throughput(1).failure_threshold(0.1),
    );

    let _ = executor
        .execute(
            "tenant-a",
            "resource_a",
            HttpMethod::Get,
            || async { Err::<u32, _>(api_fault(500)) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;

    let a = executor
        .execute(
            "tenant-a",
            "resource_a",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(a, Err(PipelineFault::BrokenCircuit));

    let b = executor
        .execute(
            "tenant-a",
            "resource_b",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(b, Ok(1));
}

/// S7: `Retries=1`, action fails first with 408 then returns `42` →
/// returns `42` after exactly 2 invocations.
#[tokio::test]
async fn s7_retries_once_then_succeeds() {
    let executor = executor_for(EndpointConfig::new("movies").retries(1));
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(api_fault(408))
                    } else {
                        Ok(42u32)
                    }
                }
            },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(result, Ok(42));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 404 short-circuit (testable property 9): the action's 404 never
/// reaches retry/breaker/fallback: it resolves to the default of `T`
/// directly, without even being retried once.
#[tokio::test]
async fn not_found_short_circuits_before_any_strategy_sees_it() {
    let executor = executor_for(EndpointConfig::new("movies").retries(5));
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(api_fault(404))
                }
            },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(result, Ok(0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Testable property 7: fallback coverage flips with `handle_execution_faults`.
#[tokio::test]
async fn fallback_coverage_depends_on_handle_execution_faults() {
    let executor = executor_for(
        EndpointConfig::new("movies").failure_minimum_throughput(1).failure_threshold(0.1),
    );

    let _ = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Err::<u32, _>(api_fault(500)) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;

    let without_fallback = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(without_fallback, Err(PipelineFault::BrokenCircuit));

    let with_fallback = executor
        .execute(
            "tenant-a",
            "get_movie",
            HttpMethod::Get,
            || async { Ok::<_, PipelineFault>(1u32) },
            ExecuteOptions::new().fallback(FallbackOptions::new(true)),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(with_fallback, Ok(0));
}
