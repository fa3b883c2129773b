//! System endpoints: replica health and statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{HealthResponse, ReplicaSetStatus, StatsResponse};
use crate::app_state::AppState;

/// `GET /health` — Connectivity of every backend.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Probes every backend concurrently. The set is healthy when all backends answer, degraded when some do, unhealthy when none do.",
    responses(
        (status = 200, description = "At least one backend is reachable", body = HealthResponse),
        (status = 503, description = "No backend is reachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backends = state.replica_service.check_health().await;
    let status = ReplicaSetStatus::from_entries(&backends);
    let code = if status == ReplicaSetStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (
        code,
        Json(HealthResponse {
            status,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backends,
        }),
    )
}

/// `GET /stats` — Row statistics of every backend.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    summary = "Backend statistics",
    description = "Returns post count and newest post timestamp per backend. Unreachable backends report totalPosts = -1 and status = error. A reachable backend that has not received any write yet has no post table and reports the same; GET /health shows whether it is connected.",
    responses(
        (status = 200, description = "Per-backend statistics", body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backends = state.replica_service.collect_stats().await;
    Json(StatsResponse {
        timestamp: Utc::now(),
        backends,
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{Backend, BackendRegistry};
    use crate::persistence::{MemoryStore, PostStore};
    use crate::service::ReplicaService;

    fn make_state(stores: &[Arc<MemoryStore>]) -> AppState {
        let backends = stores
            .iter()
            .enumerate()
            .map(|(idx, store)| {
                Backend::new(format!("b{idx}"), Arc::clone(store) as Arc<dyn PostStore>)
            })
            .collect();
        let Ok(registry) = BackendRegistry::new(backends) else {
            panic!("registry should build");
        };
        AppState {
            replica_service: Arc::new(ReplicaService::new(Arc::new(registry))),
            max_batch_size: 10,
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let app = routes().with_state(state);
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("request should build");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_is_degraded_with_one_backend_down() {
        let stores = vec![Arc::new(MemoryStore::new()), Arc::new(MemoryStore::failing())];
        let (status, json) = get_json(make_state(&stores), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["backends"][0]["connected"], true);
        assert_eq!(json["backends"][1]["connected"], false);
    }

    #[tokio::test]
    async fn health_is_unavailable_with_every_backend_down() {
        let stores = vec![Arc::new(MemoryStore::failing())];
        let (status, json) = get_json(make_state(&stores), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "unhealthy");
    }

    #[tokio::test]
    async fn stats_include_sentinel_entries() {
        let healthy = Arc::new(MemoryStore::new());
        let _ = healthy.ensure_schema().await;
        let stores = vec![healthy, Arc::new(MemoryStore::failing())];

        let (status, json) = get_json(make_state(&stores), "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["backends"][0]["totalPosts"], 0);
        assert_eq!(json["backends"][0]["status"], "healthy");
        assert_eq!(json["backends"][1]["totalPosts"], -1);
        assert_eq!(json["backends"][1]["status"], "error");
    }
}
