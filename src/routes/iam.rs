//! Token issuance and the tenant-scoped IAM resources.

use crate::gateway::tenant_gateway;
use crate::handlers::{
    add_user_to_group, assign_user_role, create_group, create_role, create_user, delete_group,
    delete_role, delete_user, generate_token, get_group, get_role, get_user, list_group_users,
    list_groups, list_role_users, list_roles, list_user_groups, list_users,
    remove_user_from_group, update_group, update_role, update_user,
};
use crate::state::AppState;
use crate::tenant::PoolProvider;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

/// POST /generate-token. Public.
pub fn token_routes<P: PoolProvider>(state: AppState<P>) -> Router {
    Router::new()
        .route("/generate-token", post(generate_token::<P>))
        .with_state(state)
}

/// Users, groups and roles; handlers read the pool the gateway binds.
pub fn resource_routes() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/users/:id/groups",
            get(list_user_groups).post(add_user_to_group),
        )
        .route("/users/:id/groups/:group_id", delete(remove_user_from_group))
        .route("/users/:id/roles", post(assign_user_role))
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/:id/users", get(list_group_users))
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/:id",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/:id/users", get(list_role_users))
}

/// Put every route of `router` behind the tenant gateway.
pub fn protect<P: PoolProvider>(router: Router, state: AppState<P>) -> Router {
    router.route_layer(from_fn_with_state(state, tenant_gateway::<P>))
}
