//! Common routes: health, readiness, version.

use crate::state::AppState;
use crate::tenant::PoolProvider;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    tenants: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unavailable: Vec<String>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Ready when every configured tenant has a live pool. Never connects.
async fn ready<P: PoolProvider>(State(state): State<AppState<P>>) -> (StatusCode, Json<ReadyBody>) {
    let unavailable: Vec<String> = state
        .tenants
        .iter()
        .filter(|t| state.registry.get(t).is_none())
        .cloned()
        .collect();
    let tenants = state.registry.len();
    if unavailable.is_empty() {
        (
            StatusCode::OK,
            Json(ReadyBody {
                status: "ok",
                tenants,
                unavailable,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                tenants,
                unavailable,
            }),
        )
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /version. No state.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

/// Common routes plus GET /ready, which reports tenant pool availability.
pub fn common_routes_with_ready<P: PoolProvider>(state: AppState<P>) -> Router {
    common_routes().merge(
        Router::new()
            .route("/ready", get(ready::<P>))
            .with_state(state),
    )
}
