//! Multi-tenant IAM backend: per-tenant PostgreSQL routing behind JWT bearer tokens.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod model;
pub mod password;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod tenant;
pub mod token;

pub use config::{validate, Settings, StartupPolicy};
pub use error::{AppError, ConfigError};
pub use gateway::{current_tenant_connection, tenant_gateway, TenantConnection};
pub use repository::{GroupRepository, RoleRepository, UserRepository};
pub use routes::{app_router, common_routes, common_routes_with_ready, protect, resource_routes, token_routes};
pub use state::AppState;
pub use store::ensure_iam_tables;
pub use tenant::{PgPoolProvider, PoolProvider, TenantAddress, TenantRegistry, TenantTarget};
pub use token::{TokenClaims, TokenService};
