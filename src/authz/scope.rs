//! Built-in default scope per role.

use super::catalog::{full_catalog, Permission, PermissionSet};
use super::role::Role;

const USUARIO_SCOPE: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTickets,
    Permission::ViewDocuments,
    Permission::DocsViewDept,
    Permission::DocsUpload,
    Permission::TicketsCreate,
    Permission::TicketsViewDept,
    Permission::OrgViewLimited,
];

const ADMINISTRATIVO_SCOPE: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewDocuments,
    Permission::DocsViewAll,
];

const CEO_SCOPE: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewTickets,
    Permission::ViewDocuments,
    Permission::ViewOrganigram,
    Permission::ViewReports,
    Permission::DocsViewAll,
    Permission::DocsApprove,
    Permission::TicketsViewAll,
    Permission::OrgViewFull,
    Permission::ReportsExport,
];

/// Baseline bundle for a role when neither an override nor an explicit list applies.
///
/// The super-role's entry is derived from the catalog, so new permissions reach it
/// without touching this table.
pub fn default_scope_for(role: Role) -> PermissionSet {
    match role {
        Role::Usuario => USUARIO_SCOPE.iter().copied().collect(),
        Role::Administrativo => ADMINISTRATIVO_SCOPE.iter().copied().collect(),
        Role::Ceo => CEO_SCOPE.iter().copied().collect(),
        Role::Desarrollador => full_catalog(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_role_default_is_the_whole_catalog() {
        let scope = default_scope_for(Role::SUPER);
        assert_eq!(scope.len(), Permission::ALL.len());
        for permission in Permission::ALL {
            assert!(scope.contains(&permission), "super role is missing {permission}");
        }
    }

    #[test]
    fn usuario_default_scope() {
        let expected = PermissionSet::from([
            Permission::ViewDashboard,
            Permission::ViewTickets,
            Permission::ViewDocuments,
            Permission::DocsViewDept,
            Permission::DocsUpload,
            Permission::TicketsCreate,
            Permission::TicketsViewDept,
            Permission::OrgViewLimited,
        ]);
        assert_eq!(default_scope_for(Role::Usuario), expected);
        assert!(!default_scope_for(Role::Usuario).contains(&Permission::TicketsDelete));
    }

    #[test]
    fn administrativo_default_has_three_entries() {
        assert_eq!(default_scope_for(Role::Administrativo).len(), 3);
    }

    #[test]
    fn ceo_sees_the_full_organigram() {
        let scope = default_scope_for(Role::Ceo);
        assert!(scope.contains(&Permission::OrgViewFull));
        assert!(!scope.contains(&Permission::OrgViewLimited));
    }

    #[test]
    fn only_the_super_role_gets_system_permissions() {
        for role in Role::ALL.into_iter().filter(|r| !r.is_super()) {
            let scope = default_scope_for(role);
            assert!(!scope.contains(&Permission::SysDevTools), "{role} has SYS_DEV_TOOLS");
            assert!(!scope.contains(&Permission::SysSwitchRole), "{role} has SYS_SWITCH_ROLE");
        }
    }

    #[test]
    fn default_scope_is_deterministic() {
        for role in Role::ALL {
            assert_eq!(default_scope_for(role), default_scope_for(role));
        }
    }
}
