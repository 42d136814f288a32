//! Shared application state for all routes.

use crate::config::Settings;
use crate::tenant::{PgPoolProvider, PoolProvider, TenantAddress, TenantRegistry};
use crate::token::TokenService;
use std::sync::Arc;

pub struct AppState<P: PoolProvider = PgPoolProvider> {
    pub registry: Arc<TenantRegistry<P>>,
    pub tokens: Arc<TokenService>,
    /// Configured tenant list; tokens are only issued for these.
    pub tenants: Arc<[String]>,
}

impl<P: PoolProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        AppState {
            registry: Arc::clone(&self.registry),
            tokens: Arc::clone(&self.tokens),
            tenants: Arc::clone(&self.tenants),
        }
    }
}

impl<P: PoolProvider> AppState<P> {
    pub fn new(registry: TenantRegistry<P>, tokens: TokenService, tenants: Vec<String>) -> Self {
        AppState {
            registry: Arc::new(registry),
            tokens: Arc::new(tokens),
            tenants: tenants.into(),
        }
    }

    pub fn is_known_tenant(&self, tenant_id: &str) -> bool {
        self.tenants.iter().any(|t| t == tenant_id)
    }
}

impl AppState<PgPoolProvider> {
    /// Postgres-backed state. Pools are not opened here; see `TenantRegistry::initialize`.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry = TenantRegistry::new(
            PgPoolProvider::from_settings(&settings.db),
            TenantAddress::from_settings(&settings.db),
            settings.db.connect_timeout,
        );
        AppState::new(
            registry,
            TokenService::from_settings(&settings.token),
            settings.tenants.clone(),
        )
    }
}
