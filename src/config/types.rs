//! Typed process settings. Built by the loader, checked by the validator.

use std::time::Duration;

/// Default token lifetime: 5 hours.
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 300;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";

/// What `TenantRegistry::initialize` does when one tenant cannot be reached at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Abort startup on the first tenant that fails to connect.
    #[default]
    FailFast,
    /// Log the failure and continue; the tenant is retried lazily on first request.
    Tolerant,
}

impl std::str::FromStr for StartupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "strict" => Ok(StartupPolicy::FailFast),
            "tolerant" | "partial" => Ok(StartupPolicy::Tolerant),
            other => Err(format!("expected fail_fast or tolerant, got {}", other)),
        }
    }
}

/// Limits applied uniformly to every tenant pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_open: u32,
    pub max_idle: u32,
    /// Connections kept warm even when idle. Never above `max_idle`.
    pub min_idle: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        PoolLimits {
            max_open: 25,
            max_idle: 10,
            min_idle: 0,
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Shared credentials and address for all tenant databases on one server.
#[derive(Clone)]
pub struct DbSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: String,
    pub connect_timeout: Duration,
    pub limits: PoolLimits,
    /// Create the IAM tables in each tenant database when its pool is first built.
    pub ensure_schema: bool,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout", &self.connect_timeout)
            .field("limits", &self.limits)
            .field("ensure_schema", &self.ensure_schema)
            .finish()
    }
}

#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub db: DbSettings,
    pub token: TokenSettings,
    /// Known tenants (database names), in configured order, deduplicated.
    pub tenants: Vec<String>,
    pub startup_policy: StartupPolicy,
    pub bind_addr: String,
}
