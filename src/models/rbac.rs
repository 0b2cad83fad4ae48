use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::{Permission, PermissionGroup, PermissionSet, ResolutionSource, Role};
use crate::events::{Loggable, Severity};

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogEntry {
    pub id: Permission,
    #[schema(value_type = String, example = "Ver panel principal")]
    pub label: &'static str,
    pub group: PermissionGroup,
}

impl From<Permission> for CatalogEntry {
    fn from(permission: Permission) -> Self {
        CatalogEntry {
            id: permission,
            label: permission.label(),
            group: permission.group(),
        }
    }
}

// =============================================================================
// ROLE SCOPE (computed)
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleScope {
    pub role: Role,
    pub source: ResolutionSource,
    pub permissions: Vec<Permission>,
}

// =============================================================================
// SCOPE OVERRIDE
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ScopeOverrideView {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Raw identifiers so unknown entries can be reported instead of failing JSON extraction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideWriteRequest {
    #[schema(example = json!(["VIEW_SECURITY", "SECURITY_MANAGE_USERS"]))]
    pub permissions: Vec<String>,
}

/// Audit record for a write or reset of a role's override.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeOverrideChange {
    pub role: Role,
    pub acting_role: Role,
    pub permissions: Vec<Permission>,
}

impl ScopeOverrideChange {
    pub fn new(role: Role, acting_role: Role, permissions: &PermissionSet) -> Self {
        Self {
            role,
            acting_role,
            permissions: permissions.iter().copied().collect(),
        }
    }
}

impl Loggable for ScopeOverrideChange {
    fn entity_type() -> &'static str { "scope_override" }
    fn subject(&self) -> String { self.role.to_string() }
    fn severity(&self) -> Severity { Severity::Critical }
}
