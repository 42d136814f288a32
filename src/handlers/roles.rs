//! /roles handlers.

use crate::error::AppError;
use crate::gateway::TenantConnection;
use crate::model::{RoleCreateRequest, RoleUpdateRequest};
use crate::response::{created, many, ok};
use crate::service::{parse_uuid, RoleService};
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};

pub async fn list_roles(conn: TenantConnection) -> Result<impl IntoResponse, AppError> {
    Ok(many(RoleService::list(conn.handle()).await?))
}

pub async fn get_role(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(RoleService::get(conn.handle(), parse_uuid(&id)?).await?))
}

/// Users currently holding the role.
pub async fn list_role_users(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(many(RoleService::users(conn.handle(), parse_uuid(&id)?).await?))
}

pub async fn create_role(
    conn: TenantConnection,
    Json(body): Json<RoleCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = RoleService::create(conn.handle(), body).await?;
    tracing::info!(tenant = %conn.tenant_id(), rid = %role.rid, "role created");
    Ok(created(role))
}

pub async fn update_role(
    conn: TenantConnection,
    Path(id): Path<String>,
    Json(body): Json<RoleUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(RoleService::update(conn.handle(), parse_uuid(&id)?, body).await?))
}

pub async fn delete_role(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    RoleService::delete(conn.handle(), parse_uuid(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
