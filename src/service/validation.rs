//! Input checks shared by the IAM services.

use crate::error::AppError;
use crate::model::UserSearchParams;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$";

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|_| AppError::BadRequest("invalid uuid".into()))
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = match EMAIL.get() {
        Some(re) => re,
        None => {
            let re = Regex::new(EMAIL_PATTERN)
                .map_err(|e| AppError::Internal(format!("email pattern: {}", e)))?;
            EMAIL.get_or_init(|| re)
        }
    };
    if re.is_match(email) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email".into()))
    }
}

/// Trimmed, non-empty name.
pub fn require_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(name)
}

/// `Some(trimmed)` when the field was sent with content; empty means "keep".
pub fn provided(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Validated form of the `GET /users` query string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSearch {
    /// `ILIKE` pattern, already wrapped in `%`.
    pub name_pattern: Option<String>,
    pub limit: i64,
    /// Whitelisted `ORDER BY` clause body.
    pub order_by: &'static str,
}

impl UserSearch {
    pub fn from_params(params: &UserSearchParams) -> Result<Self, AppError> {
        let name_pattern = provided(&params.name).map(|n| format!("%{}%", escape_like(n)));
        let limit = match provided(&params.limit) {
            None => DEFAULT_LIMIT,
            Some(raw) => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest("Invalid limit value".into()))?;
                if n <= 0 {
                    return Err(AppError::BadRequest("Limit must be greater than zero".into()));
                }
                n.min(MAX_LIMIT)
            }
        };
        let order_by = match provided(&params.orderby) {
            None => "created_at ASC",
            Some(raw) => order_clause(raw)?,
        };
        Ok(UserSearch {
            name_pattern,
            limit,
            order_by,
        })
    }
}

fn order_clause(raw: &str) -> Result<&'static str, AppError> {
    let mut parts = raw.split_whitespace();
    let column = parts.next().unwrap_or_default().to_ascii_lowercase();
    let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(_) => return Err(invalid_order(raw)),
    };
    if parts.next().is_some() {
        return Err(invalid_order(raw));
    }
    Ok(match (column.as_str(), descending) {
        ("name", false) => "name ASC",
        ("name", true) => "name DESC",
        ("email", false) => "email ASC",
        ("email", true) => "email DESC",
        ("status", false) => "status ASC",
        ("status", true) => "status DESC",
        _ => return Err(invalid_order(raw)),
    })
}

fn invalid_order(raw: &str) -> AppError {
    AppError::BadRequest(format!(
        "invalid orderby {:?}: expected name, email or status, optionally followed by asc or desc",
        raw
    ))
}
