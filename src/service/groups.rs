//! Groups and their members.

use super::users::require_group;
use super::validation::require_name;
use super::{group_exists, group_not_found};
use crate::error::AppError;
use crate::model::{GroupRequest, GroupResponse, UserResponse};
use crate::repository::GroupRepository;
use uuid::Uuid;

pub struct GroupService;

impl GroupService {
    pub async fn list<R>(repo: &R) -> Result<Vec<GroupResponse>, AppError>
    where
        R: GroupRepository + ?Sized,
    {
        repo.list_groups().await
    }

    pub async fn get<R>(repo: &R, gid: Uuid) -> Result<GroupResponse, AppError>
    where
        R: GroupRepository + ?Sized,
    {
        require_group(repo, gid).await
    }

    pub async fn users<R>(repo: &R, gid: Uuid) -> Result<Vec<UserResponse>, AppError>
    where
        R: GroupRepository + ?Sized,
    {
        require_group(repo, gid).await?;
        repo.members_of_group(gid).await
    }

    pub async fn create<R>(repo: &R, req: GroupRequest) -> Result<GroupResponse, AppError>
    where
        R: GroupRepository + ?Sized,
    {
        let name = require_name(&req.name)?;
        if repo.group_name_taken(name, None).await? {
            return Err(group_exists());
        }
        repo.insert_group(GroupResponse {
            gid: Uuid::new_v4(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn update<R>(repo: &R, gid: Uuid, req: GroupRequest) -> Result<GroupResponse, AppError>
    where
        R: GroupRepository + ?Sized,
    {
        let name = require_name(&req.name)?;
        require_group(repo, gid).await?;
        if repo.group_name_taken(name, Some(gid)).await? {
            return Err(group_exists());
        }
        repo.rename_group(gid, name)
            .await?
            .ok_or_else(group_not_found)
    }

    /// Memberships go first, then the group.
    pub async fn delete<R>(repo: &R, gid: Uuid) -> Result<(), AppError>
    where
        R: GroupRepository + ?Sized,
    {
        if !repo.delete_group(gid).await? {
            return Err(group_not_found());
        }
        tracing::info!(gid = %gid, "group deleted");
        Ok(())
    }
}
