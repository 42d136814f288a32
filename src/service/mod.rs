//! IAM business rules over the tenant repositories.

mod groups;
mod roles;
mod users;
pub mod validation;

pub use groups::GroupService;
pub use roles::RoleService;
pub use users::UserService;
pub use validation::{parse_uuid, UserSearch};

use crate::error::AppError;

pub(crate) fn user_exists() -> AppError {
    AppError::BadRequest("User already exists".into())
}

pub(crate) fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub(crate) fn group_exists() -> AppError {
    AppError::BadRequest("Group already exists".into())
}

pub(crate) fn group_not_found() -> AppError {
    AppError::NotFound("Group not found".into())
}

pub(crate) fn role_exists() -> AppError {
    AppError::BadRequest("Role already exists".into())
}

pub(crate) fn role_not_found() -> AppError {
    AppError::NotFound("Role not found".into())
}
