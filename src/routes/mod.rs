//! Router assembly.

mod common;
mod iam;

pub use common::{common_routes, common_routes_with_ready};
pub use iam::{protect, resource_routes, token_routes};

use crate::state::AppState;
use crate::tenant::PgPoolProvider;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies above this are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// The full service: public routes, gateway-protected IAM routes, access log.
pub fn app_router(state: AppState<PgPoolProvider>) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(token_routes(state.clone()))
        .merge(protect(resource_routes(), state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)),
        )
}
