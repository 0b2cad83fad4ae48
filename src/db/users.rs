use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::user::{encode_explicit_permissions, NewUser, User};
use crate::db::row_parsers;

pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> AppResult<User> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(&new_user.email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::bad_request("email already in use"));
    }

    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO users (id, name, email, role, department, explicit_permissions, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(new_user.role.as_str())
    .bind(&new_user.department)
    .bind(encode_explicit_permissions(&new_user.explicit_permissions))
    .bind(now)
    .execute(pool)
    .await?;

    find_user(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("user vanished after insert"))
}

pub async fn find_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, role, department, explicit_permissions, created_at FROM users WHERE id = ?",
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_parsers::db_user_from_row(&row)?.try_into()?)),
        None => Ok(None),
    }
}
