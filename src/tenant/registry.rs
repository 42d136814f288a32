//! The single owner of tenant pools.
//!
//! The map is read-locked on the hot path. A miss takes the write lock only to
//! insert an empty per-tenant cell (re-checking under the lock), then builds the
//! pool through that cell outside the map lock. Concurrent first requests for
//! one tenant therefore share one build, and a slow tenant never blocks lookups
//! for the others.

use super::{PoolProvider, TenantAddress, TenantTarget};
use crate::config::{validate_tenant_id, StartupPolicy};
use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;

type Slot<H> = Arc<OnceCell<H>>;

pub struct TenantRegistry<P: PoolProvider> {
    provider: P,
    address: TenantAddress,
    connect_timeout: Duration,
    entries: RwLock<HashMap<String, Slot<P::Handle>>>,
}

impl<P: PoolProvider> TenantRegistry<P> {
    pub fn new(provider: P, address: TenantAddress, connect_timeout: Duration) -> Self {
        TenantRegistry {
            provider,
            address,
            connect_timeout,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the tenant's pool, building it on first use. At most one pool is
    /// ever built per tenant; a failed build is retried by the next caller.
    pub async fn get_or_create(&self, tenant_id: &str) -> Result<P::Handle, AppError> {
        let slot = self.slot(tenant_id)?;
        if let Some(handle) = slot.get() {
            return Ok(handle.clone());
        }
        let handle = slot.get_or_try_init(|| self.establish(tenant_id)).await?;
        Ok(handle.clone())
    }

    /// Existing pool only; never connects.
    pub fn get(&self, tenant_id: &str) -> Option<P::Handle> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(tenant_id).and_then(|slot| slot.get().cloned())
    }

    /// Eagerly build pools for the known tenants. Returns the tenants that failed
    /// (always empty under `FailFast`, which returns the first error instead).
    pub async fn initialize<S: AsRef<str>>(
        &self,
        tenant_ids: &[S],
        policy: StartupPolicy,
    ) -> Result<Vec<String>, AppError> {
        let mut failed = Vec::new();
        for tenant_id in tenant_ids.iter().map(AsRef::as_ref) {
            match self.get_or_create(tenant_id).await {
                Ok(_) => {}
                Err(e) if policy == StartupPolicy::FailFast => {
                    tracing::error!(tenant = %tenant_id, error = %e, "tenant initialization failed");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        tenant = %tenant_id,
                        error = %e,
                        "tenant unavailable at startup, will retry on first request"
                    );
                    failed.push(tenant_id.to_string());
                }
            }
        }
        tracing::info!(
            ready = tenant_ids.len() - failed.len(),
            failed = failed.len(),
            "tenant registry initialized"
        );
        Ok(failed)
    }

    /// Drop and close a tenant's pool. The next request for it builds a new one.
    ///
    /// A pool still being built is left alone: its slot stays in the map so the
    /// build's waiters and later requests keep sharing that one pool.
    pub async fn invalidate(&self, tenant_id: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let ready = entries.get(tenant_id).map_or(false, |slot| slot.initialized());
            if ready {
                entries.remove(tenant_id)
            } else {
                None
            }
        };
        match removed.and_then(|slot| slot.get().cloned()) {
            Some(handle) => {
                self.provider.close(handle).await;
                tracing::info!(tenant = %tenant_id, "tenant pool invalidated");
                true
            }
            None => false,
        }
    }

    /// Tenants with a live pool, sorted.
    pub fn tenants(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = entries
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, tenant_id: &str) -> Result<Slot<P::Handle>, AppError> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = entries.get(tenant_id) {
                return Ok(slot.clone());
            }
        }
        validate_tenant_id(tenant_id).map_err(AppError::BadRequest)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another request may have inserted the slot between the two locks.
        let slot = entries
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()));
        Ok(slot.clone())
    }

    async fn establish(&self, tenant_id: &str) -> Result<P::Handle, AppError> {
        let target = TenantTarget {
            tenant_id: tenant_id.to_string(),
            dsn: self.address.dsn(tenant_id)?,
        };
        tracing::info!(
            tenant = %tenant_id,
            dsn = %self.address.redacted_dsn(tenant_id)?,
            "connecting tenant database"
        );
        let handle = tokio::time::timeout(self.connect_timeout, self.provider.connect(&target))
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "timed out connecting to tenant database {}",
                    tenant_id
                ))
            })??;
        tracing::info!(tenant = %tenant_id, "tenant pool ready");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Handle standing in for a pool: remembers which tenant and which build produced it.
    #[derive(Clone, Debug)]
    struct FakePool {
        tenant_id: String,
        serial: usize,
    }

    #[derive(Default)]
    struct CountingProvider {
        created: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        failing: Arc<std::sync::Mutex<HashSet<String>>>,
        delay: Duration,
    }

    #[async_trait]
    impl PoolProvider for CountingProvider {
        type Handle = FakePool;

        async fn connect(&self, target: &TenantTarget) -> Result<FakePool, AppError> {
            tokio::time::sleep(self.delay).await;
            if self.failing.lock().unwrap().contains(&target.tenant_id) {
                return Err(AppError::Internal(format!("{} is down", target.tenant_id)));
            }
            let serial = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(FakePool {
                tenant_id: target.tenant_id.clone(),
                serial,
            })
        }

        async fn close(&self, _handle: FakePool) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn address() -> TenantAddress {
        TenantAddress::new("iam", "secret", "localhost", 5432, "disable")
    }

    fn registry(provider: CountingProvider) -> TenantRegistry<CountingProvider> {
        TenantRegistry::new(provider, address(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn creates_once_and_reuses() {
        let provider = CountingProvider::default();
        let created = provider.created.clone();
        let reg = registry(provider);

        let first = reg.get_or_create("acme").await.unwrap();
        for _ in 0..10 {
            let again = reg.get_or_create("acme").await.unwrap();
            assert_eq!(again.serial, first.serial);
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(reg.tenants(), vec!["acme"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_builds_one_pool() {
        let provider = CountingProvider {
            delay: Duration::from_millis(50),
            ..Default::default()
        };
        let created = provider.created.clone();
        let reg = Arc::new(registry(provider));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let reg = reg.clone();
            tasks.push(tokio::spawn(async move { reg.get_or_create("acme").await }));
        }
        let mut serials = HashSet::new();
        for t in tasks {
            let pool = t.await.unwrap().unwrap();
            assert_eq!(pool.tenant_id, "acme");
            serials.insert(pool.serial);
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(serials.len(), 1);
    }

    #[tokio::test]
    async fn distinct_tenants_get_distinct_pools() {
        let reg = registry(CountingProvider::default());
        let a = reg.get_or_create("acme").await.unwrap();
        let b = reg.get_or_create("globex").await.unwrap();
        assert_eq!(a.tenant_id, "acme");
        assert_eq!(b.tenant_id, "globex");
        assert_ne!(a.serial, b.serial);
        assert_eq!(reg.len(), 2);
    }

    #[tokio::test]
    async fn failure_is_isolated_and_retried() {
        let provider = CountingProvider::default();
        let failing = provider.failing.clone();
        failing.lock().unwrap().insert("acme".to_string());
        let reg = registry(provider);

        assert!(matches!(
            reg.get_or_create("acme").await,
            Err(AppError::Internal(_))
        ));
        let globex = reg.get_or_create("globex").await.unwrap();
        assert_eq!(globex.tenant_id, "globex");
        assert!(reg.get("acme").is_none());
        assert_eq!(reg.tenants(), vec!["globex"]);

        failing.lock().unwrap().clear();
        let acme = reg.get_or_create("acme").await.unwrap();
        assert_eq!(acme.tenant_id, "acme");
        assert_eq!(reg.get("globex").unwrap().serial, globex.serial);
    }

    #[tokio::test]
    async fn connect_timeout_is_internal_error() {
        let provider = CountingProvider {
            delay: Duration::from_millis(200),
            ..Default::default()
        };
        let reg = TenantRegistry::new(provider, address(), Duration::from_millis(20));
        match reg.get_or_create("acme").await {
            Err(AppError::Internal(msg)) => assert!(msg.contains("timed out"), "{}", msg),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_tenant_id_is_rejected_without_connecting() {
        let provider = CountingProvider::default();
        let created = provider.created.clone();
        let reg = registry(provider);
        assert!(matches!(
            reg.get_or_create("../etc").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(reg.get_or_create("").await, Err(AppError::BadRequest(_))));
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn initialize_fail_fast_stops_on_first_error() {
        let provider = CountingProvider::default();
        provider.failing.lock().unwrap().insert("globex".to_string());
        let reg = registry(provider);
        let result = reg
            .initialize(&["acme", "globex", "initech"], StartupPolicy::FailFast)
            .await;
        assert!(result.is_err());
        assert_eq!(reg.tenants(), vec!["acme"]);
    }

    #[tokio::test]
    async fn initialize_tolerant_reports_failures() {
        let provider = CountingProvider::default();
        provider.failing.lock().unwrap().insert("globex".to_string());
        let reg = registry(provider);
        let failed = reg
            .initialize(&["acme", "globex", "initech"], StartupPolicy::Tolerant)
            .await
            .unwrap();
        assert_eq!(failed, vec!["globex"]);
        assert_eq!(reg.tenants(), vec!["acme", "initech"]);
    }

    #[tokio::test]
    async fn invalidate_closes_and_rebuilds() {
        let provider = CountingProvider::default();
        let created = provider.created.clone();
        let closed = provider.closed.clone();
        let reg = registry(provider);

        let first = reg.get_or_create("acme").await.unwrap();
        let other = reg.get_or_create("globex").await.unwrap();
        assert!(reg.invalidate("acme").await);
        assert!(!reg.invalidate("acme").await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(reg.get("acme").is_none());
        assert_eq!(reg.get("globex").unwrap().serial, other.serial);

        let second = reg.get_or_create("acme").await.unwrap();
        assert_ne!(first.serial, second.serial);
        assert_eq!(created.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn invalidate_leaves_pool_under_construction() {
        let provider = CountingProvider {
            delay: Duration::from_millis(100),
            ..Default::default()
        };
        let created = provider.created.clone();
        let closed = provider.closed.clone();
        let reg = Arc::new(registry(provider));

        let building = {
            let reg = reg.clone();
            tokio::spawn(async move { reg.get_or_create("acme").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reg.invalidate("acme").await);

        let first = building.await.unwrap().unwrap();
        let second = reg.get_or_create("acme").await.unwrap();
        assert_eq!(first.serial, second.serial);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 0);

        assert!(reg.invalidate("acme").await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(reg.is_empty());
    }
}
