//! Authorization engine
//!
//! This module implements the intranet's role-based permission engine:
//! - Closed permission catalog with display labels
//! - Built-in default scope per role
//! - Persisted per-role scope overrides, writable only by the super-role
//! - Ordered resolution of a session's effective permissions
//! - The `has_permission` check and the role switch operation
//!
//! Permission changes made by the super-role reach other users on their next
//! session resolution (login, restore or role switch), not immediately.

mod catalog;
mod errors;
mod resolver;
mod role;
mod scope;
mod session;
mod store;

pub use catalog::{full_catalog, parse_permissions, Permission, PermissionGroup, PermissionSet};
pub use errors::{AuthzError, AuthzResult};
pub use resolver::{
    DefaultScopeStep, ExplicitListStep, PermissionResolver, Resolution, ResolutionRequest,
    ResolutionSource, ResolutionStep, RoleOverrideStep, SuperRoleStep,
};
pub use role::Role;
pub use scope::default_scope_for;
pub use session::{has_permission, has_permission_named, Session, SessionSubject};
pub use store::{MemoryBackend, OverrideBackend, ScopeOverrideStore, SqliteBackend};
