//! Thin Axum host demonstrating the resilience pipeline engine.
//!
//! `GET /movies/:id` and `GET /users/:id` each run one `Executor::execute`
//! call against the in-process [`upstream::Upstream`] simulator and map
//! the resulting `PipelineFault` to an HTTP status per the table in
//! `SPEC_FULL.md` §6. `GET /reload` re-binds endpoint configuration from
//! `config.toml`/environment and clears the registry so already-built
//! pipelines pick up the new values. `POST /admin/chaos` dials the
//! upstream's injected failure rate and latency so the breaker and
//! timeout can be watched reacting live, the same role the teacher's
//! `examples/axum-resilient-kv-store` chaos endpoint plays.
//!
//! This binary is a caller of the pipeline, not part of it. Its own
//! routing and JSON shapes are explicitly out of scope as a feature
//! surface (`SPEC_FULL.md` §1).

mod upstream;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use resilience::core::{HttpMethod, OperationFault, PipelineFault};
use resilience::executor::{ExecuteOptions, Executor};
use resilience::registry::{ConfigFileSource, ConfigSourceError, EndpointConfig, EndpointConfigSource, Registry};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use upstream::Upstream;

/// Wraps a shared `ConfigFileSource` so the host can keep a handle to
/// call `reload()` on it after the same instance has been handed by value
/// into the `Registry` it backs: `Registry::new` takes ownership of its
/// source, so a plain `ConfigFileSource` couldn't be reached again once
/// wrapped.
#[derive(Clone)]
struct SharedConfigSource(Arc<ConfigFileSource>);

impl SharedConfigSource {
    fn load() -> Result<Self, ConfigSourceError> {
        Ok(Self(Arc::new(ConfigFileSource::load()?)))
    }

    fn reload(&self) -> Result<(), ConfigSourceError> {
        self.0.reload()
    }
}

impl EndpointConfigSource for SharedConfigSource {
    fn get(&self, name: &str) -> Option<EndpointConfig> {
        self.0.get(name)
    }
}

#[derive(Clone)]
struct AppState {
    movies_executor: Arc<Executor<SharedConfigSource>>,
    users_executor: Arc<Executor<SharedConfigSource>>,
    registry: Arc<Registry<SharedConfigSource>>,
    config_source: SharedConfigSource,
    upstream: Arc<Upstream>,
}

impl AppState {
    fn new() -> Result<Self, ConfigSourceError> {
        let config_source = SharedConfigSource::load()?;
        let registry = Arc::new(Registry::new(config_source.clone()));
        Ok(Self {
            movies_executor: Arc::new(Executor::new("movies", Arc::clone(&registry))),
            users_executor: Arc::new(Executor::new("users", Arc::clone(&registry))),
            registry,
            config_source,
            upstream: Arc::new(Upstream::seeded()),
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let state = AppState::new().expect("binding endpoint configuration failed");

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = TcpListener::bind(addr).await.expect("bind error");

    tracing::info!("Listening on http://{addr}");
    tracing::info!("Try it:");
    tracing::info!("  curl http://{addr}/movies/1");
    tracing::info!("  curl http://{addr}/movies/999            # 404");
    tracing::info!("  curl -X POST 'http://{addr}/admin/chaos?rate=0.9'");
    tracing::info!("  curl http://{addr}/movies/1                # now mostly 503s, then BrokenCircuit");
    tracing::info!("  curl -X GET http://{addr}/reload");

    axum::serve(listener, app(state).into_make_service()).await.expect("server error");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/movies/:id", get(get_movie))
        .route("/users/:id", get(get_user))
        .route("/reload", get(reload))
        .route("/admin/chaos", post(set_chaos))
        .route("/health/live", get(health_live))
        .with_state(state)
}

async fn get_movie(Path(id): Path<u64>, State(state): State<AppState>) -> axum::response::Response {
    let upstream = Arc::clone(&state.upstream);
    let result = state
        .movies_executor
        .execute(
            "public",
            "get_movie",
            HttpMethod::Get,
            move || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.fetch_movie(id).await }
            },
            ExecuteOptions::new().throw_if_not_found(true),
            CancellationToken::new(),
        )
        .await;

    match result {
        Ok(movie) => Json(movie).into_response(),
        Err(fault) => fault_response(fault),
    }
}

async fn get_user(Path(id): Path<u64>, State(state): State<AppState>) -> axum::response::Response {
    let upstream = Arc::clone(&state.upstream);
    let result = state
        .users_executor
        .execute(
            "public",
            "get_user",
            HttpMethod::Get,
            move || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.fetch_user(id).await }
            },
            ExecuteOptions::new().throw_if_not_found(true),
            CancellationToken::new(),
        )
        .await;

    match result {
        Ok(user) => Json(user).into_response(),
        Err(fault) => fault_response(fault),
    }
}

/// Host-edge translation of a classified `PipelineFault` into the HTTP
/// status map from `SPEC_FULL.md` §6.
fn fault_response(fault: PipelineFault) -> axum::response::Response {
    let status = match &fault {
        PipelineFault::RateLimitRejected => StatusCode::TOO_MANY_REQUESTS,
        PipelineFault::BrokenCircuit | PipelineFault::IsolatedCircuit | PipelineFault::TimeoutRejected => StatusCode::SERVICE_UNAVAILABLE,
        PipelineFault::Operation(OperationFault::Api { status: 404, .. }) => StatusCode::NOT_FOUND,
        PipelineFault::Operation(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": fault.to_string() }))).into_response()
}

async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    match state.config_source.reload() {
        Ok(()) => {
            state.registry.clear();
            tracing::info!(generation = state.registry.generation(), "configuration reloaded");
            (StatusCode::OK, Json(json!({ "status": "reloaded", "generation": state.registry.generation() })))
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() }))),
    }
}

#[derive(Deserialize)]
struct ChaosParams {
    rate: f64,
    #[serde(default)]
    latency_ms: u64,
}

/// Dials the upstream simulator's injected failure rate and latency so
/// the breaker and timeout can be watched reacting to a degrading
/// dependency without a real one.
async fn set_chaos(State(state): State<AppState>, Query(params): Query<ChaosParams>) -> impl IntoResponse {
    state.upstream.set_chaos(params.rate, params.latency_ms);
    let (rate, latency_ms) = state.upstream.chaos_snapshot();
    tracing::info!(rate, latency_ms, "chaos dials updated");
    Json(json!({ "failure_rate": rate, "latency_ms": latency_ms }))
}

async fn health_live() -> impl IntoResponse {
    Json(json!({ "status": "alive" }))
}
