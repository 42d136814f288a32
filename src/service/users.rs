//! User accounts, group membership and role assignment.

use super::validation::{provided, require_name, validate_email, UserSearch};
use super::{group_not_found, role_not_found, user_exists, user_not_found};
use crate::error::AppError;
use crate::model::{
    GroupResponse, NewUser, UserChanges, UserCreateRequest, UserDetail, UserRecord, UserResponse,
    UserUpdateRequest,
};
use crate::password;
use crate::repository::{GroupRepository, RoleRepository, UserRepository};
use uuid::Uuid;

pub struct UserService;

impl UserService {
    /// Name search (case-insensitive substring), bounded and ordered by whitelist.
    pub async fn list<R>(repo: &R, search: &UserSearch) -> Result<Vec<UserResponse>, AppError>
    where
        R: UserRepository + ?Sized,
    {
        repo.search_users(search).await
    }

    pub async fn get<R>(repo: &R, uid: Uuid) -> Result<UserDetail, AppError>
    where
        R: UserRepository + RoleRepository + ?Sized,
    {
        let user = Self::require(repo, uid).await?;
        let groups = repo.groups_of_user(uid).await?;
        let role = match user.role_rid {
            Some(rid) => repo.find_role(rid).await?,
            None => None,
        };
        Ok(UserDetail {
            uid: user.uid,
            name: user.name,
            email: user.email,
            status: user.status,
            groups,
            role,
        })
    }

    pub async fn groups<R>(repo: &R, uid: Uuid) -> Result<Vec<GroupResponse>, AppError>
    where
        R: UserRepository + ?Sized,
    {
        Self::require(repo, uid).await?;
        repo.groups_of_user(uid).await
    }

    pub async fn create<R>(repo: &R, req: UserCreateRequest) -> Result<UserResponse, AppError>
    where
        R: UserRepository + ?Sized,
    {
        let name = require_name(&req.name)?.to_string();
        let email = req.email.trim().to_string();
        if repo.email_taken(&email, None).await? {
            return Err(user_exists());
        }
        validate_email(&email)?;
        password::validate_strength(&req.password)?;
        let password_hash = password::hash_blocking(req.password).await?;

        repo.insert_user(NewUser {
            uid: Uuid::new_v4(),
            name,
            email,
            password_hash,
            status: req.status,
        })
        .await
    }

    /// Partial update: absent or blank fields keep their stored values.
    pub async fn update<R>(
        repo: &R,
        uid: Uuid,
        req: UserUpdateRequest,
    ) -> Result<UserResponse, AppError>
    where
        R: UserRepository + ?Sized,
    {
        let current = Self::require(repo, uid).await?;

        let name = provided(&req.name).unwrap_or(current.name.as_str()).to_string();
        let email = match provided(&req.email) {
            Some(email) if email != current.email => {
                validate_email(email)?;
                if repo.email_taken(email, Some(uid)).await? {
                    return Err(user_exists());
                }
                email.to_string()
            }
            _ => current.email.clone(),
        };
        let password_hash = match req.password.filter(|p| !p.is_empty()) {
            Some(pw) => {
                password::validate_strength(&pw)?;
                Some(password::hash_blocking(pw).await?)
            }
            None => None,
        };
        let changes = UserChanges {
            name,
            email,
            status: req.status.unwrap_or(current.status),
            password_hash,
        };
        repo.update_user(uid, changes)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Memberships go first, then the user.
    pub async fn delete<R>(repo: &R, uid: Uuid) -> Result<(), AppError>
    where
        R: UserRepository + ?Sized,
    {
        if !repo.delete_user(uid).await? {
            return Err(user_not_found());
        }
        tracing::info!(uid = %uid, "user deleted");
        Ok(())
    }

    /// Idempotent: joining a group twice is not an error.
    pub async fn join_group<R>(repo: &R, uid: Uuid, gid: Uuid) -> Result<(), AppError>
    where
        R: UserRepository + GroupRepository + ?Sized,
    {
        Self::require(repo, uid).await?;
        require_group(repo, gid).await?;
        repo.add_membership(uid, gid).await
    }

    pub async fn leave_group<R>(repo: &R, uid: Uuid, gid: Uuid) -> Result<(), AppError>
    where
        R: UserRepository + GroupRepository + ?Sized,
    {
        Self::require(repo, uid).await?;
        require_group(repo, gid).await?;
        if !repo.remove_membership(uid, gid).await? {
            return Err(AppError::NotFound("User is not a member of the group".into()));
        }
        Ok(())
    }

    /// A user holds at most one role; assigning replaces it.
    pub async fn assign_role<R>(repo: &R, uid: Uuid, rid: Uuid) -> Result<(), AppError>
    where
        R: UserRepository + RoleRepository + ?Sized,
    {
        let user = Self::require(repo, uid).await?;
        if repo.find_role(rid).await?.is_none() {
            return Err(role_not_found());
        }
        if user.role_rid == Some(rid) {
            return Err(AppError::BadRequest(
                "User already has the specified role".into(),
            ));
        }
        repo.set_user_role(uid, rid).await
    }

    async fn require<R>(repo: &R, uid: Uuid) -> Result<UserRecord, AppError>
    where
        R: UserRepository + ?Sized,
    {
        repo.find_user(uid).await?.ok_or_else(user_not_found)
    }
}

pub(crate) async fn require_group<R>(repo: &R, gid: Uuid) -> Result<GroupResponse, AppError>
where
    R: GroupRepository + ?Sized,
{
    repo.find_group(gid).await?.ok_or_else(group_not_found)
}
