//! Tenant access tokens: HS256 JWTs whose claims name the tenant database.

use crate::config::TokenSettings;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const BEARER: &str = "bearer";

/// Verified token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Tenant identifier (database name).
    #[serde(alias = "database")]
    pub database_name: String,
    /// Expiry as unix seconds; mirrors `exp`.
    #[serde(default)]
    pub expires: i64,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl TokenClaims {
    pub fn tenant_id(&self) -> &str {
        &self.database_name
    }

    /// Earliest of `exp` and `expires` (when the latter is set).
    fn expires_at(&self) -> i64 {
        if self.expires > 0 {
            self.exp.min(self.expires)
        } else {
            self.exp
        }
    }
}

/// Issues and validates tenant tokens. Stateless apart from the key pair and TTL.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_settings(settings: &TokenSettings) -> Self {
        TokenService::new(&settings.secret, settings.ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, tenant_id: &str) -> Result<String, AppError> {
        self.issue_at(tenant_id, Utc::now())
    }

    /// Sign a token for `tenant_id` that expires `ttl` after `now`.
    pub fn issue_at(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        if tenant_id.is_empty() {
            return Err(AppError::BadRequest("database name is required".into()));
        }
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = iat.saturating_add(ttl);
        let claims = TokenClaims {
            database_name: tenant_id.to_string(),
            expires: exp,
            exp,
            iat,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, AppError> {
        self.validate_at(token, Utc::now())
    }

    /// Verify signature and algorithm, then require `exp > now` and a non-empty tenant.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AppError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;
        let claims = data.claims;
        if claims.expires_at() <= now.timestamp() {
            return Err(AppError::Unauthorized("token has expired".into()));
        }
        if claims.database_name.is_empty() {
            return Err(AppError::Unauthorized("Database name missing in token".into()));
        }
        Ok(claims)
    }

    /// Split `"Bearer <token>"` into scheme and token.
    pub fn parse_auth_header(header: &str) -> Result<(&str, &str), AppError> {
        if header.is_empty() {
            return Err(AppError::Unauthorized("authorization header is required".into()));
        }
        let mut parts = header.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None)
                if scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty() =>
            {
                Ok((scheme, token))
            }
            _ => Err(AppError::Unauthorized("invalid authorization header".into())),
        }
    }
}
