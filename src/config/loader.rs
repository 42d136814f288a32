//! Load settings from the process environment (after `.env`) or from any key lookup.

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

impl Settings {
    /// Read `.env` if present, then the process environment, then validate.
    pub fn from_env() -> Result<Settings, ConfigError> {
        check_dotenv(dotenvy::dotenv())?;
        Settings::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let defaults = PoolLimits::default();
        let limits = PoolLimits {
            max_open: parse_or(&get, "DB_MAX_OPEN_CONNS", defaults.max_open)?,
            max_idle: parse_or(&get, "DB_MAX_IDLE_CONNS", defaults.max_idle)?,
            min_idle: parse_or(&get, "DB_MIN_IDLE_CONNS", defaults.min_idle)?,
            max_lifetime: Duration::from_secs(parse_or(
                &get,
                "DB_CONN_MAX_LIFETIME_SECS",
                defaults.max_lifetime.as_secs(),
            )?),
            idle_timeout: Duration::from_secs(parse_or(
                &get,
                "DB_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )?),
        };

        let db = DbSettings {
            user: required("DB_USER")?,
            password: required("DB_PASS")?,
            host: required("DB_HOST")?,
            port: parse_required(&get, "DB_PORT")?,
            ssl_mode: get("DB_SSL_MODE").unwrap_or_else(|| "disable".into()),
            connect_timeout: Duration::from_secs(parse_or(&get, "DB_CONNECT_TIMEOUT_SECS", 10)?),
            limits,
            ensure_schema: parse_or(&get, "ENSURE_SCHEMA", true)?,
        };

        let ttl_minutes: u64 = parse_or(&get, "JWT_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;
        let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| ConfigError::Invalid {
            key: "JWT_TTL_MINUTES",
            reason: format!("{} minutes is out of range", ttl_minutes),
        })?;
        let token = TokenSettings {
            secret: required("JWT_SECRET")?,
            ttl: Duration::from_secs(ttl_secs),
        };

        let tenants = parse_tenant_list(&required("DATABASE_NAMES")?);

        let startup_policy = match get("TENANT_STARTUP_POLICY") {
            Some(v) => StartupPolicy::from_str(&v).map_err(|reason| ConfigError::Invalid {
                key: "TENANT_STARTUP_POLICY",
                reason,
            })?,
            None => StartupPolicy::default(),
        };

        let settings = Settings {
            db,
            token,
            tenants,
            startup_policy,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
        };
        validate(&settings)?;
        Ok(settings)
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn check_dotenv<T>(result: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Load(format!(".env: {}", e))),
    }
}

/// Split a comma-separated tenant list: trims entries, drops empties and duplicates, keeps order.
pub fn parse_tenant_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_required<G, T>(get: &G, key: &'static str) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let v = get(key).ok_or(ConfigError::Missing(key))?;
    v.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
