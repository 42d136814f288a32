//! HTTP handlers for tokens, users, groups and roles.

pub mod groups;
pub mod roles;
pub mod token;
pub mod users;
pub use groups::*;
pub use roles::*;
pub use token::*;
pub use users::*;
