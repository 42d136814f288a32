//! Settings validation: required values and pool-limit sanity.

use crate::config::Settings;
use crate::error::ConfigError;

const SSL_MODES: &[&str] = &["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.tenants.is_empty() {
        return Err(ConfigError::Invalid {
            key: "DATABASE_NAMES",
            reason: "no tenant database names configured".into(),
        });
    }
    for name in &settings.tenants {
        validate_tenant_id(name).map_err(|reason| ConfigError::Invalid {
            key: "DATABASE_NAMES",
            reason,
        })?;
    }

    let limits = &settings.db.limits;
    if limits.max_open == 0 {
        return Err(ConfigError::Invalid {
            key: "DB_MAX_OPEN_CONNS",
            reason: "must be at least 1".into(),
        });
    }
    if limits.max_idle > limits.max_open {
        return Err(ConfigError::Invalid {
            key: "DB_MAX_IDLE_CONNS",
            reason: format!("{} exceeds DB_MAX_OPEN_CONNS {}", limits.max_idle, limits.max_open),
        });
    }
    if limits.min_idle > limits.max_idle {
        return Err(ConfigError::Invalid {
            key: "DB_MIN_IDLE_CONNS",
            reason: format!("{} exceeds DB_MAX_IDLE_CONNS {}", limits.min_idle, limits.max_idle),
        });
    }
    if limits.max_lifetime.is_zero() {
        return Err(ConfigError::Invalid {
            key: "DB_CONN_MAX_LIFETIME_SECS",
            reason: "must be positive".into(),
        });
    }
    if settings.db.connect_timeout.is_zero() {
        return Err(ConfigError::Invalid {
            key: "DB_CONNECT_TIMEOUT_SECS",
            reason: "must be positive".into(),
        });
    }
    if !SSL_MODES.contains(&settings.db.ssl_mode.as_str()) {
        return Err(ConfigError::Invalid {
            key: "DB_SSL_MODE",
            reason: format!("unknown mode {}", settings.db.ssl_mode),
        });
    }
    if settings.token.ttl.is_zero() {
        return Err(ConfigError::Invalid {
            key: "JWT_TTL_MINUTES",
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

/// Tenant ids name PostgreSQL databases: 1..=63 chars of `[A-Za-z0-9_-]`.
pub fn validate_tenant_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("tenant id is empty".into());
    }
    if id.len() > 63 {
        return Err(format!("tenant id {} is longer than 63 characters", id));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(format!("tenant id {} contains invalid characters", id));
    }
    Ok(())
}
