//! Tenant database DDL. Every tenant database carries the same four tables.

use crate::error::AppError;
use sqlx::PgPool;

const IAM_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        rid UUID PRIMARY KEY,
        name TEXT NOT NULL,
        rights JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        uid UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        role_rid UUID REFERENCES roles (rid) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS users_role_rid_idx ON users (role_rid)",
    r#"
    CREATE TABLE IF NOT EXISTS groups (
        gid UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_groups (
        user_uid UUID NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
        group_gid UUID NOT NULL REFERENCES groups (gid) ON DELETE CASCADE,
        PRIMARY KEY (user_uid, group_gid)
    )
    "#,
];

/// Create the IAM tables if they do not exist. Safe to run on every pool build.
pub async fn ensure_iam_tables(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for ddl in IAM_TABLES {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
