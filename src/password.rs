//! Password policy and argon2 hashing.

use crate::error::AppError;
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Enforce length plus upper, lower, digit and special character classes.
pub fn validate_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    let mut upper = false;
    let mut lower = false;
    let mut digit = false;
    let mut special = false;
    for c in password.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else if !c.is_whitespace() {
            special = true;
        }
    }
    let missing = match (upper, lower, digit, special) {
        (false, ..) => Some("an uppercase letter"),
        (_, false, ..) => Some("a lowercase letter"),
        (_, _, false, _) => Some("a digit"),
        (.., false) => Some("a special character"),
        _ => None,
    };
    match missing {
        Some(class) => Err(AppError::BadRequest(format!(
            "Password must contain at least {}",
            class
        ))),
        None => Ok(()),
    }
}

/// PHC-formatted argon2id hash with a fresh random salt.
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

/// `hash` on the blocking thread pool.
pub async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}
