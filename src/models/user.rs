use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Permission, PermissionSet, Role, SessionSubject};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Gerencia the user belongs to; consumed by department-scoped views.
    pub department: Option<String>,
    /// Server-asserted permissions used instead of the role default when non-empty.
    pub explicit_permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn session_subject(&self) -> SessionSubject {
        SessionSubject::new(self.id, self.role)
            .with_explicit_permissions(self.explicit_permissions.iter().copied())
            .with_department(self.department.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
    pub explicit_permissions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        let role = value
            .role
            .parse::<Role>()
            .map_err(|err| AppError::internal(format!("user {}: {err}", value.id)))?;

        Ok(User {
            id: value.id,
            name: value.name,
            email: value.email,
            role,
            department: value.department,
            explicit_permissions: decode_explicit_permissions(
                value.id,
                value.explicit_permissions.as_deref(),
            ),
            created_at: value.created_at,
        })
    }
}

/// Decode the stored explicit list. Identifiers outside the catalog are
/// dropped so they can never be granted; an unreadable column reads as empty.
pub fn decode_explicit_permissions(user_id: Uuid, raw: Option<&str>) -> Vec<Permission> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    let names: Vec<String> = match serde_json::from_str(raw) {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(user_id = %user_id, error = %err, "unreadable explicit permission list");
            return Vec::new();
        }
    };

    let mut permissions = PermissionSet::new();
    for name in names {
        match name.parse::<Permission>() {
            Ok(permission) => {
                permissions.insert(permission);
            }
            Err(_) => {
                tracing::warn!(user_id = %user_id, permission = %name, "dropping unknown explicit permission");
            }
        }
    }
    permissions.into_iter().collect()
}

pub fn encode_explicit_permissions(permissions: &[Permission]) -> Option<String> {
    if permissions.is_empty() {
        return None;
    }
    let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
    serde_json::to_string(&names).ok()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub role: Role,
    #[schema(example = "Finanzas")]
    pub department: Option<String>,
    #[serde(default)]
    pub explicit_permissions: Vec<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_explicit_identifiers_are_dropped() {
        let decoded = decode_explicit_permissions(
            Uuid::new_v4(),
            Some(r#"["VIEW_REPORTS","VIEW_EVERYTHING","REPORTS_EXPORT"]"#),
        );
        assert_eq!(decoded, vec![Permission::ViewReports, Permission::ReportsExport]);
    }

    #[test]
    fn missing_or_blank_explicit_list_is_empty() {
        assert!(decode_explicit_permissions(Uuid::new_v4(), None).is_empty());
        assert!(decode_explicit_permissions(Uuid::new_v4(), Some("  ")).is_empty());
        assert!(decode_explicit_permissions(Uuid::new_v4(), Some("not json")).is_empty());
    }

    #[test]
    fn explicit_list_encoding() {
        assert_eq!(encode_explicit_permissions(&[]), None);
        assert_eq!(
            encode_explicit_permissions(&[Permission::ViewReports]).as_deref(),
            Some(r#"["VIEW_REPORTS"]"#)
        );
    }

    #[test]
    fn session_subject_carries_department_and_explicit_list() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Ceo,
            department: Some("Finanzas".to_string()),
            explicit_permissions: vec![Permission::ViewReports],
            created_at: Utc::now(),
        };

        let subject = user.session_subject();
        assert_eq!(subject.role, Role::Ceo);
        assert_eq!(subject.department.as_deref(), Some("Finanzas"));
        assert!(subject.explicit_permissions.contains(&Permission::ViewReports));
        assert_eq!(subject.role_original, None);
    }
}
