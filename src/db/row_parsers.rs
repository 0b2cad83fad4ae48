use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{session::DbSession, user::DbUser};

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339, which is what sqlx writes for DateTime<Utc>
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP: "YYYY-MM-DD HH:MM:SS" with optional fraction
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn column<T>(row: &SqliteRow, name: &str) -> Result<T, AppError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| AppError::internal(format!("missing {}: {}", name, e)))
}

fn uuid_column(row: &SqliteRow, name: &str) -> Result<Uuid, AppError> {
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", name, e)))
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    let created_at: String = column(row, "created_at")?;

    Ok(DbUser {
        id: uuid_column(row, "id")?,
        name: column(row, "name")?,
        email: column(row, "email")?,
        role: column(row, "role")?,
        department: column(row, "department")?,
        explicit_permissions: column(row, "explicit_permissions")?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn db_session_from_row(row: &SqliteRow) -> Result<DbSession, AppError> {
    let created_at: String = column(row, "created_at")?;

    Ok(DbSession {
        id: uuid_column(row, "id")?,
        user_id: uuid_column(row, "user_id")?,
        role: column(row, "role")?,
        role_original: column(row, "role_original")?,
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_sqlite_timestamps() {
        let a = parse_datetime("2026-01-01T08:30:00+00:00").unwrap();
        let b = parse_datetime("2026-01-01 08:30:00").unwrap();
        assert_eq!(a, b);

        let frac = parse_datetime("2026-01-01 08:30:00.250").unwrap();
        assert!(frac > a);

        assert!(parse_datetime("yesterday").is_err());
    }
}
