//! Reading the bound tenant connection back out of a request.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};
use sqlx::PgPool;
use std::ops::Deref;
use std::sync::Arc;

/// The tenant's pooled handle, as bound by the gateway for this request.
#[derive(Clone, Debug)]
pub struct TenantConnection<H = PgPool> {
    tenant_id: Arc<str>,
    handle: H,
}

impl<H> TenantConnection<H> {
    pub fn new(tenant_id: impl Into<Arc<str>>, handle: H) -> Self {
        TenantConnection {
            tenant_id: tenant_id.into(),
            handle,
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }
}

impl<H> Deref for TenantConnection<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

/// Fetch the connection bound to the current request.
///
/// Absence means a route was mounted without the gateway, which is a server
/// fault rather than a client one.
pub fn current_tenant_connection<H>(extensions: &Extensions) -> Result<TenantConnection<H>, AppError>
where
    H: Clone + Send + Sync + 'static,
{
    extensions
        .get::<TenantConnection<H>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("no tenant connection bound to request".into()))
}

#[async_trait]
impl<S, H> FromRequestParts<S> for TenantConnection<H>
where
    S: Send + Sync,
    H: Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_tenant_connection(&parts.extensions)
    }
}
