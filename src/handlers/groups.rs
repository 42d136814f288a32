//! /groups handlers.

use crate::error::AppError;
use crate::gateway::TenantConnection;
use crate::model::GroupRequest;
use crate::response::{created, many, ok};
use crate::service::{parse_uuid, GroupService};
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};

pub async fn list_groups(conn: TenantConnection) -> Result<impl IntoResponse, AppError> {
    Ok(many(GroupService::list(conn.handle()).await?))
}

pub async fn get_group(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(GroupService::get(conn.handle(), parse_uuid(&id)?).await?))
}

pub async fn list_group_users(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(many(GroupService::users(conn.handle(), parse_uuid(&id)?).await?))
}

pub async fn create_group(
    conn: TenantConnection,
    Json(body): Json<GroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = GroupService::create(conn.handle(), body).await?;
    tracing::info!(tenant = %conn.tenant_id(), gid = %group.gid, "group created");
    Ok(created(group))
}

pub async fn update_group(
    conn: TenantConnection,
    Path(id): Path<String>,
    Json(body): Json<GroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(GroupService::update(conn.handle(), parse_uuid(&id)?, body).await?))
}

pub async fn delete_group(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    GroupService::delete(conn.handle(), parse_uuid(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
