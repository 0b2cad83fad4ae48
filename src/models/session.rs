use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Permission, ResolutionSource, Role, Session};
use crate::events::{Loggable, Severity};

/// Persisted session record. Effective permissions are never stored.
#[derive(Debug, Clone)]
pub struct DbSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub role_original: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    /// Presented as `Authorization: Bearer <token>`.
    pub token: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_original: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub source: ResolutionSource,
    pub permissions: Vec<Permission>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        SessionView {
            token: session.id,
            user_id: session.user_id,
            role: session.role,
            role_original: session.role_original,
            department: session.department.clone(),
            source: session.resolution_source(),
            permissions: session.effective_permissions().iter().copied().collect(),
        }
    }
}

impl Loggable for SessionView {
    fn entity_type() -> &'static str { "session" }
    fn subject(&self) -> String { self.token.to_string() }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheck {
    #[schema(example = "TICKETS_DELETE")]
    pub permission: String,
    pub granted: bool,
}

/// Audit record for a role switch.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSwitch {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub from: Role,
    pub to: Role,
    pub role_original: Role,
}

impl Loggable for RoleSwitch {
    fn entity_type() -> &'static str { "session" }
    fn subject(&self) -> String { self.session_id.to_string() }
    fn severity(&self) -> Severity { Severity::Important }
}
