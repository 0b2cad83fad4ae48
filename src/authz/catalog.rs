//! Permission catalog
//!
//! The closed set of capabilities the intranet understands. Identifiers are
//! persisted inside scope overrides and user records, so the catalog is
//! append-only: removing a variant orphans stored data.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::AuthzError;

/// Ordered permission set. Iteration follows catalog order.
pub type PermissionSet = BTreeSet<Permission>;

/// Descriptive grouping used by the UI; carries no authorization meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionGroup {
    Navigation,
    ModuleAction,
    DataScope,
    System,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // Navigation
    ViewDashboard,
    ViewTickets,
    ViewDocuments,
    ViewOrganigram,
    ViewReports,
    ViewSecurity,

    // Module actions
    DocsUpload,
    DocsApprove,
    DocsDelete,
    TicketsCreate,
    TicketsAssign,
    TicketsClose,
    TicketsDelete,
    ReportsExport,
    SecurityManageUsers,
    SecurityManageScopes,

    // Data scope
    DocsViewDept,
    DocsViewAll,
    TicketsViewDept,
    TicketsViewAll,
    OrgViewLimited,
    OrgViewFull,

    // System
    SysDevTools,
    SysSwitchRole,
    SysViewLogs,
}

impl Permission {
    pub const ALL: [Permission; 25] = [
        Permission::ViewDashboard,
        Permission::ViewTickets,
        Permission::ViewDocuments,
        Permission::ViewOrganigram,
        Permission::ViewReports,
        Permission::ViewSecurity,
        Permission::DocsUpload,
        Permission::DocsApprove,
        Permission::DocsDelete,
        Permission::TicketsCreate,
        Permission::TicketsAssign,
        Permission::TicketsClose,
        Permission::TicketsDelete,
        Permission::ReportsExport,
        Permission::SecurityManageUsers,
        Permission::SecurityManageScopes,
        Permission::DocsViewDept,
        Permission::DocsViewAll,
        Permission::TicketsViewDept,
        Permission::TicketsViewAll,
        Permission::OrgViewLimited,
        Permission::OrgViewFull,
        Permission::SysDevTools,
        Permission::SysSwitchRole,
        Permission::SysViewLogs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewDashboard => "VIEW_DASHBOARD",
            Permission::ViewTickets => "VIEW_TICKETS",
            Permission::ViewDocuments => "VIEW_DOCUMENTS",
            Permission::ViewOrganigram => "VIEW_ORGANIGRAM",
            Permission::ViewReports => "VIEW_REPORTS",
            Permission::ViewSecurity => "VIEW_SECURITY",
            Permission::DocsUpload => "DOCS_UPLOAD",
            Permission::DocsApprove => "DOCS_APPROVE",
            Permission::DocsDelete => "DOCS_DELETE",
            Permission::TicketsCreate => "TICKETS_CREATE",
            Permission::TicketsAssign => "TICKETS_ASSIGN",
            Permission::TicketsClose => "TICKETS_CLOSE",
            Permission::TicketsDelete => "TICKETS_DELETE",
            Permission::ReportsExport => "REPORTS_EXPORT",
            Permission::SecurityManageUsers => "SECURITY_MANAGE_USERS",
            Permission::SecurityManageScopes => "SECURITY_MANAGE_SCOPES",
            Permission::DocsViewDept => "DOCS_VIEW_DEPT",
            Permission::DocsViewAll => "DOCS_VIEW_ALL",
            Permission::TicketsViewDept => "TICKETS_VIEW_DEPT",
            Permission::TicketsViewAll => "TICKETS_VIEW_ALL",
            Permission::OrgViewLimited => "ORG_VIEW_LIMITED",
            Permission::OrgViewFull => "ORG_VIEW_FULL",
            Permission::SysDevTools => "SYS_DEV_TOOLS",
            Permission::SysSwitchRole => "SYS_SWITCH_ROLE",
            Permission::SysViewLogs => "SYS_VIEW_LOGS",
        }
    }

    /// Display text for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Permission::ViewDashboard => "Ver panel principal",
            Permission::ViewTickets => "Ver tickets",
            Permission::ViewDocuments => "Ver documentos",
            Permission::ViewOrganigram => "Ver organigrama",
            Permission::ViewReports => "Ver reportes",
            Permission::ViewSecurity => "Ver módulo de seguridad",
            Permission::DocsUpload => "Subir documentos",
            Permission::DocsApprove => "Aprobar documentos",
            Permission::DocsDelete => "Eliminar documentos",
            Permission::TicketsCreate => "Crear tickets",
            Permission::TicketsAssign => "Asignar tickets",
            Permission::TicketsClose => "Cerrar tickets",
            Permission::TicketsDelete => "Eliminar tickets",
            Permission::ReportsExport => "Exportar reportes",
            Permission::SecurityManageUsers => "Administrar usuarios",
            Permission::SecurityManageScopes => "Administrar alcances por rol",
            Permission::DocsViewDept => "Ver documentos de mi gerencia",
            Permission::DocsViewAll => "Ver todos los documentos",
            Permission::TicketsViewDept => "Ver tickets de mi gerencia",
            Permission::TicketsViewAll => "Ver todos los tickets",
            Permission::OrgViewLimited => "Ver organigrama limitado",
            Permission::OrgViewFull => "Ver organigrama completo",
            Permission::SysDevTools => "Herramientas de desarrollo",
            Permission::SysSwitchRole => "Cambiar de rol",
            Permission::SysViewLogs => "Ver bitácora del sistema",
        }
    }

    pub fn group(self) -> PermissionGroup {
        use Permission::*;
        match self {
            ViewDashboard | ViewTickets | ViewDocuments | ViewOrganigram | ViewReports
            | ViewSecurity => PermissionGroup::Navigation,
            DocsUpload | DocsApprove | DocsDelete | TicketsCreate | TicketsAssign
            | TicketsClose | TicketsDelete | ReportsExport | SecurityManageUsers
            | SecurityManageScopes => PermissionGroup::ModuleAction,
            DocsViewDept | DocsViewAll | TicketsViewDept | TicketsViewAll | OrgViewLimited
            | OrgViewFull => PermissionGroup::DataScope,
            SysDevTools | SysSwitchRole | SysViewLogs => PermissionGroup::System,
        }
    }
}

/// The whole catalog as a set.
pub fn full_catalog() -> PermissionSet {
    Permission::ALL.into_iter().collect()
}

/// Parse a list of identifiers, rejecting the first one not in the catalog.
pub fn parse_permissions<I, S>(names: I) -> Result<PermissionSet, AuthzError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().parse::<Permission>())
        .collect()
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AuthzError::UnknownPermission(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_identifiers_are_unique() {
        let names: HashSet<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names.len(), Permission::ALL.len());
    }

    #[test]
    fn catalog_order_matches_declaration_order() {
        let mut sorted = Permission::ALL;
        sorted.sort();
        assert_eq!(sorted, Permission::ALL);
    }

    #[test]
    fn permission_string_roundtrip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>().ok(), Some(permission));
            assert_eq!(permission.to_string(), permission.as_str());
        }
    }

    #[test]
    fn serde_uses_catalog_identifiers() {
        let json = serde_json::to_string(&Permission::TicketsDelete).unwrap();
        assert_eq!(json, "\"TICKETS_DELETE\"");

        for permission in Permission::ALL {
            let json = serde_json::to_value(permission).unwrap();
            assert_eq!(json.as_str(), Some(permission.as_str()));
        }
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let err = "VIEW_EVERYTHING".parse::<Permission>().unwrap_err();
        assert!(matches!(err, AuthzError::UnknownPermission(name) if name == "VIEW_EVERYTHING"));

        // identifiers are case sensitive
        assert!("view_dashboard".parse::<Permission>().is_err());
    }

    #[test]
    fn every_permission_has_a_label() {
        for permission in Permission::ALL {
            assert!(!permission.label().is_empty(), "{permission} has no label");
        }
    }

    #[test]
    fn parse_permissions_stops_at_unknown() {
        let parsed = parse_permissions(["VIEW_SECURITY", "SECURITY_MANAGE_USERS"]).unwrap();
        assert_eq!(
            parsed,
            PermissionSet::from([Permission::ViewSecurity, Permission::SecurityManageUsers])
        );

        assert!(parse_permissions(["VIEW_SECURITY", "VIEW_SECRETS"]).is_err());
    }

    #[test]
    fn groups_are_descriptive_only() {
        assert_eq!(Permission::ViewDashboard.group(), PermissionGroup::Navigation);
        assert_eq!(Permission::TicketsDelete.group(), PermissionGroup::ModuleAction);
        assert_eq!(Permission::DocsViewDept.group(), PermissionGroup::DataScope);
        assert_eq!(Permission::SysDevTools.group(), PermissionGroup::System);
    }
}
