//! Request-scoped tenant gateway.
//!
//! Every protected request walks the same four steps, and stops at the first
//! failure:
//!
//! 1. an `Authorization` header is present and non-empty
//! 2. it carries a bearer token that validates
//! 3. the claims name a usable tenant
//! 4. the registry yields that tenant's pool
//!
//! On success the pool is bound into the request extensions as a
//! [`TenantConnection`] and the request continues. Extensions live exactly as
//! long as the request, so nothing is shared between requests except the pool.

mod extract;

pub use extract::{current_tenant_connection, TenantConnection};

use crate::config::validate_tenant_id;
use crate::error::AppError;
use crate::state::AppState;
use crate::tenant::PoolProvider;
use crate::token::TokenService;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

pub const MISSING_AUTH_HEADER: &str = "Authorization header is required";

/// Step a request was rejected at; only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    AuthHeader,
    Token,
    Tenant,
    Connection,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::AuthHeader => "auth_header",
            Stage::Token => "token",
            Stage::Tenant => "tenant",
            Stage::Connection => "connection",
        }
    }
}

fn reject(stage: Stage, path: &str, err: AppError) -> AppError {
    if stage == Stage::Connection {
        tracing::error!(stage = stage.as_str(), path = %path, error = %err, "tenant connection unavailable");
    } else {
        tracing::warn!(stage = stage.as_str(), path = %path, reason = %err, "request rejected");
    }
    err
}

/// Axum middleware; mount with `axum::middleware::from_fn_with_state`.
pub async fn tenant_gateway<P: PoolProvider>(
    State(state): State<AppState<P>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();

    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value.to_str().map_err(|_| {
            reject(
                Stage::AuthHeader,
                &path,
                AppError::Unauthorized("invalid authorization header".into()),
            )
        })?,
        _ => {
            return Err(reject(
                Stage::AuthHeader,
                &path,
                AppError::Unauthorized(MISSING_AUTH_HEADER.into()),
            ))
        }
    };

    let claims = TokenService::parse_auth_header(header)
        .and_then(|(_, token)| state.tokens.validate(token))
        .map_err(|e| reject(Stage::Token, &path, e))?;

    let tenant_id = claims.tenant_id().to_string();
    validate_tenant_id(&tenant_id).map_err(|reason| {
        reject(
            Stage::Tenant,
            &path,
            AppError::Unauthorized(format!("invalid tenant in token: {}", reason)),
        )
    })?;

    let handle = state
        .registry
        .get_or_create(&tenant_id)
        .await
        .map_err(|e| {
            let err = match e {
                AppError::Internal(_) | AppError::Db(_) => e,
                other => AppError::Internal(other.to_string()),
            };
            reject(Stage::Connection, &path, err)
        })?;

    tracing::debug!(tenant = %tenant_id, path = %path, "tenant connection bound");
    req.extensions_mut()
        .insert(TenantConnection::new(tenant_id, handle));
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
