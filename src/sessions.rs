//! Session provider
//!
//! Opens, restores, switches and closes sessions. Every restore re-resolves
//! the effective permission set from the current user record, the stored
//! session role and the override store.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{Permission, PermissionResolver, PermissionSet, Role, Session, SessionSubject};
use crate::config::SessionTtl;
use crate::db::{sessions, users};
use crate::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct SessionProvider {
    pool: SqlitePool,
    resolver: PermissionResolver,
    ttl: SessionTtl,
}

impl SessionProvider {
    pub fn new(pool: SqlitePool, resolver: PermissionResolver, ttl: SessionTtl) -> Self {
        Self { pool, resolver, ttl }
    }

    /// Login: resolve the user's permissions and persist a new session record.
    pub async fn open(&self, user_id: Uuid) -> AppResult<Session> {
        let user = users::find_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;

        let session = Session::establish(Uuid::new_v4(), user.session_subject(), &self.resolver).await;
        sessions::insert_session(&self.pool, &session).await?;

        tracing::info!(
            session_id = %session.id,
            user_id = %user.id,
            role = %session.role,
            source = ?session.resolution_source(),
            "session opened"
        );
        Ok(session)
    }

    /// Restore a session by token. `None` when the token is unknown, expired
    /// or its user no longer exists.
    pub async fn restore(&self, session_id: Uuid) -> AppResult<Option<Session>> {
        let Some(record) = sessions::find_session(&self.pool, session_id).await? else {
            return Ok(None);
        };

        if Utc::now() - record.created_at > self.ttl.0 {
            tracing::debug!(session_id = %session_id, "session expired");
            sessions::delete_session(&self.pool, session_id).await?;
            return Ok(None);
        }

        let Some(user) = users::find_user(&self.pool, record.user_id).await? else {
            return Ok(None);
        };

        let role_original = record
            .role_original
            .as_deref()
            .map(parse_stored_role)
            .transpose()?;

        // An unswitched session follows the user record. A switched one stays
        // valid only while its origin still matches the user's current role.
        let role = match role_original {
            None => user.role,
            Some(original) if original != user.role => {
                tracing::info!(
                    session_id = %session_id,
                    role_original = %original,
                    current_role = %user.role,
                    "user role changed; discarding switched session"
                );
                sessions::delete_session(&self.pool, session_id).await?;
                return Ok(None);
            }
            Some(_) => parse_stored_role(&record.role)?,
        };

        // A switched session resolves with no explicit list.
        let explicit: PermissionSet = if role_original.is_some() {
            PermissionSet::new()
        } else {
            user.explicit_permissions.iter().copied().collect()
        };

        let subject = SessionSubject::new(user.id, role)
            .with_explicit_permissions(explicit)
            .with_role_original(role_original)
            .with_department(user.department.clone());

        Ok(Some(Session::establish(record.id, subject, &self.resolver).await))
    }

    /// Re-resolve under `new_role` and persist the role in the session record.
    ///
    /// Permitted when the session's original identity holds `SYS_SWITCH_ROLE`,
    /// so a switched-down session can still switch back.
    pub async fn switch_role(&self, session: &Session, new_role: Role) -> AppResult<Session> {
        let origin = self
            .resolver
            .resolve(session.original_role(), &PermissionSet::new())
            .await;
        if !session.original_role().is_super() && !origin.contains(&Permission::SysSwitchRole) {
            return Err(AppError::forbidden(format!(
                "role {} may not switch roles",
                session.original_role()
            )));
        }

        let switched = session.switch_role(new_role, &self.resolver).await;
        sessions::update_session_role(&self.pool, &switched).await?;
        Ok(switched)
    }

    /// Logout. Returns whether a session was discarded.
    pub async fn close(&self, session_id: Uuid) -> AppResult<bool> {
        sessions::delete_session(&self.pool, session_id).await
    }
}

/// Session rows are written by this service; a role it cannot read is a
/// corrupt record, not a client error.
fn parse_stored_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>().map_err(|err| {
        tracing::error!(error = %err, "unreadable role in session record");
        AppError::internal(format!("corrupt session record: {err}"))
    })
}
