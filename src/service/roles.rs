//! Roles: a name plus a CRUD rights set.

use super::validation::{provided, require_name};
use super::{role_exists, role_not_found};
use crate::error::AppError;
use crate::model::{RoleCreateRequest, RoleResponse, RoleUpdateRequest, UserResponse};
use crate::repository::RoleRepository;
use uuid::Uuid;

pub struct RoleService;

impl RoleService {
    pub async fn list<R>(repo: &R) -> Result<Vec<RoleResponse>, AppError>
    where
        R: RoleRepository + ?Sized,
    {
        repo.list_roles().await
    }

    pub async fn get<R>(repo: &R, rid: Uuid) -> Result<RoleResponse, AppError>
    where
        R: RoleRepository + ?Sized,
    {
        repo.find_role(rid).await?.ok_or_else(role_not_found)
    }

    /// Holders of the role.
    pub async fn users<R>(repo: &R, rid: Uuid) -> Result<Vec<UserResponse>, AppError>
    where
        R: RoleRepository + ?Sized,
    {
        Self::get(repo, rid).await?;
        repo.holders_of_role(rid).await
    }

    /// The same name may exist with different rights; name plus rights is unique.
    pub async fn create<R>(repo: &R, req: RoleCreateRequest) -> Result<RoleResponse, AppError>
    where
        R: RoleRepository + ?Sized,
    {
        let name = require_name(&req.name)?;
        let rights = req
            .rights
            .ok_or_else(|| AppError::BadRequest("rights are required".into()))?;
        if repo.role_taken(name, &rights, None).await? {
            return Err(role_exists());
        }
        repo.insert_role(RoleResponse {
            rid: Uuid::new_v4(),
            name: name.to_string(),
            rights,
        })
        .await
    }

    /// Missing name or rights keep their stored values.
    pub async fn update<R>(
        repo: &R,
        rid: Uuid,
        req: RoleUpdateRequest,
    ) -> Result<RoleResponse, AppError>
    where
        R: RoleRepository + ?Sized,
    {
        let current = Self::get(repo, rid).await?;
        let name = provided(&req.name).unwrap_or(current.name.as_str()).to_string();
        let rights = req.rights.unwrap_or(current.rights);
        if repo.role_taken(&name, &rights, Some(rid)).await? {
            return Err(role_exists());
        }
        repo.update_role(RoleResponse { rid, name, rights })
            .await?
            .ok_or_else(role_not_found)
    }

    /// Holders lose the role first, then it is deleted.
    pub async fn delete<R>(repo: &R, rid: Uuid) -> Result<(), AppError>
    where
        R: RoleRepository + ?Sized,
    {
        if !repo.delete_role(rid).await? {
            return Err(role_not_found());
        }
        tracing::info!(rid = %rid, "role deleted");
        Ok(())
    }
}
