//! The repositories over a tenant's `PgPool`.

use super::{GroupRepository, RoleRepository, UserRepository};
use crate::error::AppError;
use crate::model::{
    GroupResponse, NewUser, RoleResponse, RoleRow, Rights, UserChanges, UserRecord, UserResponse,
};
use crate::service::validation::is_unique_violation;
use crate::service::{group_exists, user_exists, UserSearch};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "uid, name, email, status";

fn or_duplicate(duplicate: fn() -> AppError) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        if is_unique_violation(&e) {
            duplicate()
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl UserRepository for PgPool {
    async fn search_users(&self, search: &UserSearch) -> Result<Vec<UserResponse>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY {} LIMIT $2",
            USER_COLUMNS, search.order_by
        );
        tracing::debug!(sql = %sql, limit = search.limit, "query");
        let users = sqlx::query_as::<_, UserResponse>(&sql)
            .bind(search.name_pattern.as_deref())
            .bind(search.limit)
            .fetch_all(self)
            .await?;
        Ok(users)
    }

    async fn find_user(&self, uid: Uuid) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT uid, name, email, status, role_rid FROM users WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(self)
        .await?;
        Ok(user)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR uid <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(self)
        .await?;
        Ok(taken)
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserResponse, AppError> {
        let sql = format!(
            "INSERT INTO users (uid, name, email, password_hash, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        tracing::debug!(sql = %sql, "query");
        sqlx::query_as::<_, UserResponse>(&sql)
            .bind(user.uid)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.status)
            .fetch_one(self)
            .await
            .map_err(or_duplicate(user_exists))
    }

    async fn update_user(
        &self,
        uid: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, AppError> {
        let sql = format!(
            "UPDATE users SET name = $2, email = $3, status = $4, \
             password_hash = COALESCE($5, password_hash) WHERE uid = $1 RETURNING {}",
            USER_COLUMNS
        );
        tracing::debug!(sql = %sql, "query");
        sqlx::query_as::<_, UserResponse>(&sql)
            .bind(uid)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(changes.status)
            .bind(changes.password_hash.as_deref())
            .fetch_optional(self)
            .await
            .map_err(or_duplicate(user_exists))
    }

    async fn delete_user(&self, uid: Uuid) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM user_groups WHERE user_uid = $1")
            .bind(uid)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn groups_of_user(&self, uid: Uuid) -> Result<Vec<GroupResponse>, AppError> {
        let groups = sqlx::query_as::<_, GroupResponse>(
            "SELECT g.gid, g.name FROM groups g \
             JOIN user_groups ug ON ug.group_gid = g.gid \
             WHERE ug.user_uid = $1 ORDER BY g.name",
        )
        .bind(uid)
        .fetch_all(self)
        .await?;
        Ok(groups)
    }

    async fn add_membership(&self, uid: Uuid, gid: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_groups (user_uid, group_gid) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(uid)
        .bind(gid)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn remove_membership(&self, uid: Uuid, gid: Uuid) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM user_groups WHERE user_uid = $1 AND group_gid = $2")
            .bind(uid)
            .bind(gid)
            .execute(self)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn set_user_role(&self, uid: Uuid, rid: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET role_rid = $2 WHERE uid = $1")
            .bind(uid)
            .bind(rid)
            .execute(self)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for PgPool {
    async fn list_groups(&self) -> Result<Vec<GroupResponse>, AppError> {
        let groups = sqlx::query_as::<_, GroupResponse>("SELECT gid, name FROM groups ORDER BY name")
            .fetch_all(self)
            .await?;
        Ok(groups)
    }

    async fn find_group(&self, gid: Uuid) -> Result<Option<GroupResponse>, AppError> {
        let group = sqlx::query_as::<_, GroupResponse>("SELECT gid, name FROM groups WHERE gid = $1")
            .bind(gid)
            .fetch_optional(self)
            .await?;
        Ok(group)
    }

    async fn group_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM groups WHERE name = $1 AND ($2::uuid IS NULL OR gid <> $2))",
        )
        .bind(name)
        .bind(except)
        .fetch_one(self)
        .await?;
        Ok(taken)
    }

    async fn insert_group(&self, group: GroupResponse) -> Result<GroupResponse, AppError> {
        sqlx::query_as::<_, GroupResponse>(
            "INSERT INTO groups (gid, name) VALUES ($1, $2) RETURNING gid, name",
        )
        .bind(group.gid)
        .bind(&group.name)
        .fetch_one(self)
        .await
        .map_err(or_duplicate(group_exists))
    }

    async fn rename_group(&self, gid: Uuid, name: &str) -> Result<Option<GroupResponse>, AppError> {
        sqlx::query_as::<_, GroupResponse>(
            "UPDATE groups SET name = $2 WHERE gid = $1 RETURNING gid, name",
        )
        .bind(gid)
        .bind(name)
        .fetch_optional(self)
        .await
        .map_err(or_duplicate(group_exists))
    }

    async fn delete_group(&self, gid: Uuid) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM user_groups WHERE group_gid = $1")
            .bind(gid)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM groups WHERE gid = $1")
            .bind(gid)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn members_of_group(&self, gid: Uuid) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, UserResponse>(
            "SELECT u.uid, u.name, u.email, u.status FROM users u \
             JOIN user_groups ug ON ug.user_uid = u.uid \
             WHERE ug.group_gid = $1 ORDER BY u.name",
        )
        .bind(gid)
        .fetch_all(self)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl RoleRepository for PgPool {
    async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT rid, name, rights FROM roles ORDER BY name")
            .fetch_all(self)
            .await?;
        Ok(rows.into_iter().map(RoleResponse::from).collect())
    }

    async fn find_role(&self, rid: Uuid) -> Result<Option<RoleResponse>, AppError> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT rid, name, rights FROM roles WHERE rid = $1")
            .bind(rid)
            .fetch_optional(self)
            .await?;
        Ok(row.map(RoleResponse::from))
    }

    async fn role_taken(
        &self,
        name: &str,
        rights: &Rights,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1 AND rights = $2 \
             AND ($3::uuid IS NULL OR rid <> $3))",
        )
        .bind(name)
        .bind(Json(rights))
        .bind(except)
        .fetch_one(self)
        .await?;
        Ok(taken)
    }

    async fn insert_role(&self, role: RoleResponse) -> Result<RoleResponse, AppError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "INSERT INTO roles (rid, name, rights) VALUES ($1, $2, $3) RETURNING rid, name, rights",
        )
        .bind(role.rid)
        .bind(&role.name)
        .bind(Json(role.rights))
        .fetch_one(self)
        .await?;
        Ok(row.into())
    }

    async fn update_role(&self, role: RoleResponse) -> Result<Option<RoleResponse>, AppError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "UPDATE roles SET name = $2, rights = $3 WHERE rid = $1 RETURNING rid, name, rights",
        )
        .bind(role.rid)
        .bind(&role.name)
        .bind(Json(role.rights))
        .fetch_optional(self)
        .await?;
        Ok(row.map(RoleResponse::from))
    }

    async fn delete_role(&self, rid: Uuid) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;
        sqlx::query("UPDATE users SET role_rid = NULL WHERE role_rid = $1")
            .bind(rid)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM roles WHERE rid = $1")
            .bind(rid)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn holders_of_role(&self, rid: Uuid) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, UserResponse>(
            "SELECT uid, name, email, status FROM users WHERE role_rid = $1 ORDER BY name",
        )
        .bind(rid)
        .fetch_all(self)
        .await?;
        Ok(users)
    }
}
