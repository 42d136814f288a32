//! sqlx-backed pool provider.

use super::{PoolProvider, TenantTarget};
use crate::config::{DbSettings, PoolLimits};
use crate::error::AppError;
use crate::store::ensure_iam_tables;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct PgPoolProvider {
    limits: PoolLimits,
    acquire_timeout: Duration,
    ensure_schema: bool,
}

impl PgPoolProvider {
    pub fn new(limits: PoolLimits, acquire_timeout: Duration, ensure_schema: bool) -> Self {
        PgPoolProvider {
            limits,
            acquire_timeout,
            ensure_schema,
        }
    }

    pub fn from_settings(db: &DbSettings) -> Self {
        PgPoolProvider::new(db.limits.clone(), db.connect_timeout, db.ensure_schema)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.limits.max_open)
            .min_connections(self.limits.min_idle)
            .max_lifetime(Some(self.limits.max_lifetime))
            .idle_timeout(Some(self.limits.idle_timeout))
            .acquire_timeout(self.acquire_timeout)
    }
}

#[async_trait]
impl PoolProvider for PgPoolProvider {
    type Handle = PgPool;

    async fn connect(&self, target: &TenantTarget) -> Result<PgPool, AppError> {
        let opts = PgConnectOptions::from_str(&target.dsn).map_err(|e| {
            AppError::Internal(format!("invalid DSN for tenant {}: {}", target.tenant_id, e))
        })?;
        let pool = self.pool_options().connect_with(opts).await.map_err(|e| {
            AppError::Internal(format!(
                "failed to connect to tenant database {}: {}",
                target.tenant_id, e
            ))
        })?;
        if self.ensure_schema {
            ensure_iam_tables(&pool).await?;
        }
        Ok(pool)
    }

    async fn close(&self, handle: PgPool) {
        handle.close().await;
    }
}
