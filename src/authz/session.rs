use uuid::Uuid;

use super::catalog::{Permission, PermissionSet};
use super::resolver::{PermissionResolver, ResolutionSource};
use super::role::Role;

/// Identity supplied by the session provider at login or restore.
#[derive(Debug, Clone)]
pub struct SessionSubject {
    pub user_id: Uuid,
    pub role: Role,
    pub role_original: Option<Role>,
    pub explicit_permissions: PermissionSet,
    pub department: Option<String>,
}

impl SessionSubject {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            role_original: None,
            explicit_permissions: PermissionSet::new(),
            department: None,
        }
    }

    pub fn with_explicit_permissions(mut self, perms: impl IntoIterator<Item = Permission>) -> Self {
        self.explicit_permissions = perms.into_iter().collect();
        self
    }

    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn with_role_original(mut self, role: Option<Role>) -> Self {
        self.role_original = role;
        self
    }
}

/// An authenticated session with its resolved permissions.
///
/// Sessions are values: every change of role produces a new `Session` with a
/// freshly resolved permission set.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    /// The role held before the first switch, if any.
    pub role_original: Option<Role>,
    pub explicit_permissions: PermissionSet,
    pub department: Option<String>,
    effective_permissions: PermissionSet,
    source: ResolutionSource,
}

impl Session {
    /// Resolve the subject's permissions and bind them to `id`.
    pub async fn establish(id: Uuid, subject: SessionSubject, resolver: &PermissionResolver) -> Self {
        let resolution = resolver
            .resolve_with_source(subject.role, &subject.explicit_permissions)
            .await;

        Self {
            id,
            user_id: subject.user_id,
            role: subject.role,
            role_original: subject.role_original,
            explicit_permissions: subject.explicit_permissions,
            department: subject.department,
            effective_permissions: resolution.permissions,
            source: resolution.source,
        }
    }

    /// Re-resolve under `new_role` with no explicit list.
    ///
    /// The first role ever held is kept in `role_original` across any number
    /// of switches.
    pub async fn switch_role(&self, new_role: Role, resolver: &PermissionResolver) -> Session {
        let subject = SessionSubject {
            user_id: self.user_id,
            role: new_role,
            role_original: self.role_original.or(Some(self.role)),
            explicit_permissions: PermissionSet::new(),
            department: self.department.clone(),
        };

        tracing::info!(
            session_id = %self.id,
            user_id = %self.user_id,
            from = %self.role,
            to = %new_role,
            "role switched"
        );

        Session::establish(self.id, subject, resolver).await
    }

    /// The role this identity started with, before any switch.
    pub fn original_role(&self) -> Role {
        self.role_original.unwrap_or(self.role)
    }

    pub fn effective_permissions(&self) -> &PermissionSet {
        &self.effective_permissions
    }

    pub fn resolution_source(&self) -> ResolutionSource {
        self.source
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        has_permission(Some(self), permission)
    }
}

/// Authorization check used to gate every action and UI affordance.
///
/// No session denies; the super-role is granted regardless of how its
/// permissions were resolved.
pub fn has_permission(session: Option<&Session>, permission: Permission) -> bool {
    let Some(session) = session else {
        return false;
    };

    if session.role.is_super() {
        return true;
    }

    let granted = session.effective_permissions.contains(&permission);
    if !granted {
        tracing::debug!(
            user_id = %session.user_id,
            role = %session.role,
            permission = %permission,
            "permission denied"
        );
    }
    granted
}

/// String form of [`has_permission`]; identifiers outside the catalog are never granted.
pub fn has_permission_named(session: Option<&Session>, permission: &str) -> bool {
    match permission.parse::<Permission>() {
        Ok(permission) => has_permission(session, permission),
        Err(_) => {
            tracing::warn!(permission = %permission, "check against unknown permission");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::catalog::full_catalog;
    use crate::authz::scope::default_scope_for;
    use crate::authz::store::ScopeOverrideStore;

    fn resolver() -> PermissionResolver {
        PermissionResolver::new(ScopeOverrideStore::in_memory())
    }

    async fn session_for(role: Role) -> Session {
        Session::establish(
            Uuid::new_v4(),
            SessionSubject::new(Uuid::new_v4(), role),
            &resolver(),
        )
        .await
    }

    #[test]
    fn no_session_is_never_granted() {
        for permission in Permission::ALL {
            assert!(!has_permission(None, permission));
        }
        assert!(!has_permission_named(None, "VIEW_DASHBOARD"));
    }

    #[tokio::test]
    async fn super_role_is_granted_everything() {
        let session = session_for(Role::Desarrollador).await;
        for permission in Permission::ALL {
            assert!(session.has_permission(permission));
        }
    }

    #[tokio::test]
    async fn super_role_check_does_not_depend_on_resolved_set() {
        // A custom chain that resolves nothing stands in for a stale or skipped resolution.
        let empty = PermissionResolver::with_steps(Vec::new());
        let session = Session::establish(
            Uuid::new_v4(),
            SessionSubject::new(Uuid::new_v4(), Role::Desarrollador),
            &empty,
        )
        .await;

        assert!(session.effective_permissions().is_empty());
        assert!(has_permission(Some(&session), Permission::SysDevTools));
        assert!(has_permission(Some(&session), Permission::SecurityManageScopes));
    }

    #[tokio::test]
    async fn usuario_cannot_delete_tickets() {
        let session = session_for(Role::Usuario).await;
        assert!(session.has_permission(Permission::TicketsCreate));
        assert!(!session.has_permission(Permission::TicketsDelete));
    }

    #[tokio::test]
    async fn unknown_identifiers_are_never_granted() {
        let session = session_for(Role::Usuario).await;
        assert!(has_permission_named(Some(&session), "VIEW_TICKETS"));
        assert!(!has_permission_named(Some(&session), "VIEW_TICKET"));
        assert!(!has_permission_named(Some(&session), ""));
    }

    #[tokio::test]
    async fn explicit_permissions_shape_the_session() {
        let subject = SessionSubject::new(Uuid::new_v4(), Role::Usuario)
            .with_explicit_permissions([Permission::ViewReports])
            .with_department(Some("Finanzas".to_string()));
        let session = Session::establish(Uuid::new_v4(), subject, &resolver()).await;

        assert_eq!(session.resolution_source(), ResolutionSource::Explicit);
        assert!(session.has_permission(Permission::ViewReports));
        assert!(!session.has_permission(Permission::ViewDashboard));
        assert_eq!(session.department.as_deref(), Some("Finanzas"));
    }

    #[tokio::test]
    async fn switch_to_ceo_grants_full_organigram() {
        let resolver = resolver();
        let before = Session::establish(
            Uuid::new_v4(),
            SessionSubject::new(Uuid::new_v4(), Role::Usuario),
            &resolver,
        )
        .await;
        assert!(!before.has_permission(Permission::OrgViewFull));

        let after = before.switch_role(Role::Ceo, &resolver).await;
        assert_eq!(after.role, Role::Ceo);
        assert_eq!(after.role_original, Some(Role::Usuario));
        assert_eq!(after.id, before.id);
        assert_eq!(after.user_id, before.user_id);
        assert!(after.has_permission(Permission::OrgViewFull));

        // the original value is untouched
        assert_eq!(before.role, Role::Usuario);
        assert_eq!(before.role_original, None);
    }

    #[tokio::test]
    async fn original_role_survives_repeated_switches() {
        let resolver = resolver();
        let session = session_for(Role::Desarrollador).await;

        let as_usuario = session.switch_role(Role::Usuario, &resolver).await;
        let as_ceo = as_usuario.switch_role(Role::Ceo, &resolver).await;

        assert_eq!(as_ceo.role_original, Some(Role::Desarrollador));
        assert_eq!(as_ceo.original_role(), Role::Desarrollador);
        assert_eq!(*as_ceo.effective_permissions(), default_scope_for(Role::Ceo));

        let back = as_ceo.switch_role(Role::Desarrollador, &resolver).await;
        assert_eq!(*back.effective_permissions(), full_catalog());
        assert_eq!(back.role_original, Some(Role::Desarrollador));
    }

    #[tokio::test]
    async fn switch_drops_the_explicit_list() {
        let resolver = resolver();
        let subject = SessionSubject::new(Uuid::new_v4(), Role::Usuario)
            .with_explicit_permissions([Permission::ViewReports]);
        let session = Session::establish(Uuid::new_v4(), subject, &resolver).await;

        let switched = session.switch_role(Role::Usuario, &resolver).await;
        assert!(switched.explicit_permissions.is_empty());
        assert_eq!(*switched.effective_permissions(), default_scope_for(Role::Usuario));
    }

    #[tokio::test]
    async fn sessions_keep_their_set_until_resolved_again() {
        let store = ScopeOverrideStore::in_memory();
        let resolver = PermissionResolver::new(store.clone());
        let session = Session::establish(
            Uuid::new_v4(),
            SessionSubject::new(Uuid::new_v4(), Role::Administrativo),
            &resolver,
        )
        .await;

        let pair = PermissionSet::from([Permission::ViewSecurity, Permission::SecurityManageUsers]);
        store
            .write_override(Role::Administrativo, &pair, Role::Desarrollador)
            .await
            .unwrap();

        assert_eq!(*session.effective_permissions(), default_scope_for(Role::Administrativo));

        let restored = Session::establish(
            session.id,
            SessionSubject::new(session.user_id, Role::Administrativo),
            &resolver,
        )
        .await;
        assert_eq!(*restored.effective_permissions(), pair);
    }
}
