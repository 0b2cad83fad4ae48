use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{Role, Session};
use crate::db::row_parsers;
use crate::errors::AppResult;
use crate::models::session::DbSession;

pub async fn insert_session(pool: &SqlitePool, session: &Session) -> AppResult<()> {
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO sessions (id, user_id, role, role_original, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(session.id.to_string())
    .bind(session.user_id.to_string())
    .bind(session.role.as_str())
    .bind(session.role_original.map(Role::as_str))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_session(pool: &SqlitePool, session_id: Uuid) -> AppResult<Option<DbSession>> {
    let row = sqlx::query(
        "SELECT id, user_id, role, role_original, created_at FROM sessions WHERE id = ?",
    )
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_parsers::db_session_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Persist the role after a switch.
pub async fn update_session_role(pool: &SqlitePool, session: &Session) -> AppResult<()> {
    sqlx::query("UPDATE sessions SET role = ?, role_original = ?, updated_at = ? WHERE id = ?")
        .bind(session.role.as_str())
        .bind(session.role_original.map(Role::as_str))
        .bind(Utc::now())
        .bind(session.id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_session(pool: &SqlitePool, session_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
