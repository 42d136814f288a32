//! Request and response bodies for users, groups, roles and tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CRUD rights carried by a role. Missing flags default to `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rights {
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserResponse {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub status: i32,
}

/// Stored user, minus the password hash.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub status: i32,
    pub role_rid: Option<Uuid>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        UserResponse {
            uid: user.uid,
            name: user.name,
            email: user.email,
            status: user.status,
        }
    }
}

/// A validated user ready to insert.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub status: i32,
}

/// Resolved values for an update; `password_hash: None` keeps the stored hash.
#[derive(Clone, Debug)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub status: i32,
    pub password_hash: Option<String>,
}

/// A user with its memberships and role.
#[derive(Clone, Debug, Serialize)]
pub struct UserDetail {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub status: i32,
    pub groups: Vec<GroupResponse>,
    pub role: Option<RoleResponse>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserCreateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub status: i32,
}

/// Absent or empty fields keep their stored values.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub status: Option<i32>,
}

/// Query string for `GET /users`. Kept as raw strings so bad values get our error body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserSearchParams {
    pub name: Option<String>,
    pub limit: Option<String>,
    pub orderby: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AddUserToGroupRequest {
    pub group_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AddUserToRoleRequest {
    pub role_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GroupResponse {
    pub gid: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GroupRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleResponse {
    pub rid: Uuid,
    pub name: String,
    pub rights: Rights,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RoleRow {
    pub rid: Uuid,
    pub name: String,
    pub rights: sqlx::types::Json<Rights>,
}

impl From<RoleRow> for RoleResponse {
    fn from(row: RoleRow) -> Self {
        RoleResponse {
            rid: row.rid,
            name: row.name,
            rights: row.rights.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleCreateRequest {
    #[serde(default)]
    pub name: String,
    pub rights: Option<Rights>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoleUpdateRequest {
    pub name: Option<String>,
    pub rights: Option<Rights>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub database: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}
