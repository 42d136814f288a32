//! /users handlers.

use crate::error::AppError;
use crate::gateway::TenantConnection;
use crate::model::{
    AddUserToGroupRequest, AddUserToRoleRequest, UserCreateRequest, UserSearchParams,
    UserUpdateRequest,
};
use crate::response::{created, many, ok};
use crate::service::{parse_uuid, UserSearch, UserService};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// GET /users?name=&limit=&orderby=
pub async fn list_users(
    conn: TenantConnection,
    Query(params): Query<UserSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let search = UserSearch::from_params(&params)?;
    Ok(many(UserService::list(conn.handle(), &search).await?))
}

/// GET /users/:id
pub async fn get_user(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    Ok(ok(UserService::get(conn.handle(), uid).await?))
}

/// GET /users/:id/groups
pub async fn list_user_groups(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    Ok(many(UserService::groups(conn.handle(), uid).await?))
}

/// POST /users
pub async fn create_user(
    conn: TenantConnection,
    Json(body): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::create(conn.handle(), body).await?;
    tracing::info!(tenant = %conn.tenant_id(), uid = %user.uid, "user created");
    Ok(created(user))
}

/// PUT /users/:id
pub async fn update_user(
    conn: TenantConnection,
    Path(id): Path<String>,
    Json(body): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    Ok(ok(UserService::update(conn.handle(), uid, body).await?))
}

/// DELETE /users/:id
pub async fn delete_user(
    conn: TenantConnection,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    UserService::delete(conn.handle(), uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/:id/groups
pub async fn add_user_to_group(
    conn: TenantConnection,
    Path(id): Path<String>,
    Json(body): Json<AddUserToGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    let gid = parse_uuid(&body.group_id)?;
    UserService::join_group(conn.handle(), uid, gid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/:id/groups/:group_id
pub async fn remove_user_from_group(
    conn: TenantConnection,
    Path((id, group_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    let gid = parse_uuid(&group_id)?;
    UserService::leave_group(conn.handle(), uid, gid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/:id/roles
pub async fn assign_user_role(
    conn: TenantConnection,
    Path(id): Path<String>,
    Json(body): Json<AddUserToRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let uid = parse_uuid(&id)?;
    let rid = parse_uuid(&body.role_id)?;
    UserService::assign_role(conn.handle(), uid, rid).await?;
    Ok(StatusCode::NO_CONTENT)
}
