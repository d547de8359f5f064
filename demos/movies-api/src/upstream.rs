//! An in-process stand-in for the upstream movies/users API.
//!
//! There is no real HTTP transport in this exercise (see `SPEC_FULL.md`
//! §1 Non-goals); this simulates one well enough to exercise every fault
//! the pipeline classifies: 404s for unknown ids, chaos-injected 503s,
//! and chaos-injected latency long enough to trip the timeout, the same
//! role the teacher's `examples/axum-resilient-kv-store` chaos-injecting
//! `DatabaseService` plays for its circuit breaker.

use rand::Rng;
use resilience::core::{HttpMethod, OperationFault, PipelineFault};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub year: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Holds the seeded movie/user catalogue plus the chaos dials an operator
/// twiddles through `/admin/chaos` to make the resilience stack visibly
/// react.
pub struct Upstream {
    movies: RwLock<HashMap<u64, Movie>>,
    users: RwLock<HashMap<u64, User>>,
    chaos_failure_rate_bits: AtomicU32,
    chaos_latency_millis: AtomicU64,
}

impl Upstream {
    pub fn seeded() -> Self {
        let mut movies = HashMap::new();
        movies.insert(1, Movie { id: 1, title: "The Matrix".into(), year: 1999 });
        movies.insert(2, Movie { id: 2, title: "Blade Runner".into(), year: 1982 });

        let mut users = HashMap::new();
        users.insert(1, User { id: 1, name: "ada".into() });
        users.insert(2, User { id: 2, name: "grace".into() });

        Self {
            movies: RwLock::new(movies),
            users: RwLock::new(users),
            chaos_failure_rate_bits: AtomicU32::new(0),
            chaos_latency_millis: AtomicU64::new(0),
        }
    }

    pub fn set_chaos(&self, failure_rate: f64, latency_millis: u64) {
        self.chaos_failure_rate_bits.store(failure_rate.clamp(0.0, 1.0).to_bits() as u32, Ordering::Relaxed);
        self.chaos_latency_millis.store(latency_millis, Ordering::Relaxed);
    }

    pub fn chaos_snapshot(&self) -> (f64, u64) {
        let rate = f64::from_bits(self.chaos_failure_rate_bits.load(Ordering::Relaxed) as u64);
        (rate, self.chaos_latency_millis.load(Ordering::Relaxed))
    }

    pub async fn fetch_movie(&self, id: u64) -> Result<Movie, PipelineFault> {
        self.inject_chaos(format!("/movies/{id}")).await?;
        self.movies.read().unwrap().get(&id).cloned().ok_or_else(|| not_found(format!("/movies/{id}")))
    }

    pub async fn fetch_user(&self, id: u64) -> Result<User, PipelineFault> {
        self.inject_chaos(format!("/users/{id}")).await?;
        self.users.read().unwrap().get(&id).cloned().ok_or_else(|| not_found(format!("/users/{id}")))
    }

    async fn inject_chaos(&self, uri: String) -> Result<(), PipelineFault> {
        let latency = self.chaos_latency_millis.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let (rate, _) = self.chaos_snapshot();
        if rand::rng().random::<f64>() < rate {
            tracing::warn!(uri, "chaos: injected upstream failure");
            return Err(PipelineFault::Operation(OperationFault::Api { status: 503, method: HttpMethod::Get, uri }));
        }
        Ok(())
    }
}

fn not_found(uri: String) -> PipelineFault {
    PipelineFault::Operation(OperationFault::Api { status: 404, method: HttpMethod::Get, uri })
}
