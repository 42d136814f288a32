//! POST /generate-token: mint a bearer token for a configured tenant.

use crate::config::validate_tenant_id;
use crate::error::AppError;
use crate::model::{TokenRequest, TokenResponse};
use crate::response::ok;
use crate::state::AppState;
use crate::tenant::PoolProvider;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn generate_token<P: PoolProvider>(
    State(state): State<AppState<P>>,
    Json(body): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = body.database.trim();
    if tenant_id.is_empty() {
        return Err(AppError::BadRequest("database is required".into()));
    }
    validate_tenant_id(tenant_id).map_err(AppError::BadRequest)?;
    if !state.is_known_tenant(tenant_id) {
        return Err(AppError::NotFound(format!("tenant not found: {}", tenant_id)));
    }
    let token = state.tokens.issue(tenant_id)?;
    tracing::info!(tenant = %tenant_id, "token issued");
    Ok(ok(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.tokens.ttl().as_secs(),
    }))
}
