//! Storage seam under the IAM services.
//!
//! Services hold the rules (validation, duplicate checks, not-found handling)
//! and talk to storage only through these traits. `PgPool` implements all of
//! them; tests use an in-memory store.

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use crate::error::AppError;
use crate::model::{
    GroupResponse, NewUser, RoleResponse, Rights, UserChanges, UserRecord, UserResponse,
};
use crate::service::UserSearch;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn search_users(&self, search: &UserSearch) -> Result<Vec<UserResponse>, AppError>;

    async fn find_user(&self, uid: Uuid) -> Result<Option<UserRecord>, AppError>;

    /// Whether another user (not `except`) already has `email`.
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Fails with "User already exists" if the email is taken by the time of the insert.
    async fn insert_user(&self, user: NewUser) -> Result<UserResponse, AppError>;

    async fn update_user(
        &self,
        uid: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, AppError>;

    /// Removes the user's memberships, then the user, atomically. `false` if absent.
    async fn delete_user(&self, uid: Uuid) -> Result<bool, AppError>;

    async fn groups_of_user(&self, uid: Uuid) -> Result<Vec<GroupResponse>, AppError>;

    /// No-op when the membership already exists.
    async fn add_membership(&self, uid: Uuid, gid: Uuid) -> Result<(), AppError>;

    /// `false` when there was no such membership.
    async fn remove_membership(&self, uid: Uuid, gid: Uuid) -> Result<bool, AppError>;

    async fn set_user_role(&self, uid: Uuid, rid: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<GroupResponse>, AppError>;

    async fn find_group(&self, gid: Uuid) -> Result<Option<GroupResponse>, AppError>;

    async fn group_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    async fn insert_group(&self, group: GroupResponse) -> Result<GroupResponse, AppError>;

    async fn rename_group(&self, gid: Uuid, name: &str) -> Result<Option<GroupResponse>, AppError>;

    /// Removes the group's memberships, then the group, atomically. `false` if absent.
    async fn delete_group(&self, gid: Uuid) -> Result<bool, AppError>;

    async fn members_of_group(&self, gid: Uuid) -> Result<Vec<UserResponse>, AppError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError>;

    async fn find_role(&self, rid: Uuid) -> Result<Option<RoleResponse>, AppError>;

    /// Whether another role (not `except`) has exactly this name and rights.
    async fn role_taken(
        &self,
        name: &str,
        rights: &Rights,
        except: Option<Uuid>,
    ) -> Result<bool, AppError>;

    async fn insert_role(&self, role: RoleResponse) -> Result<RoleResponse, AppError>;

    async fn update_role(&self, role: RoleResponse) -> Result<Option<RoleResponse>, AppError>;

    /// Clears the role from its holders, then deletes it, atomically. `false` if absent.
    async fn delete_role(&self, rid: Uuid) -> Result<bool, AppError>;

    async fn holders_of_role(&self, rid: Uuid) -> Result<Vec<UserResponse>, AppError>;
}
