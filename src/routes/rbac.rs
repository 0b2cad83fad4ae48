//! RBAC API Routes
//!
//! Read access to the permission catalog and per-role scopes, and the
//! super-role's scope override channel. Override writes and resets are
//! logged to the activity log with Critical severity.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};

use crate::app::AppState;
use crate::authz::{parse_permissions, Permission, PermissionSet, Role};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::CurrentSession;
use crate::models::rbac::*;

// =============================================================================
// ROUTER
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list_catalog))
        .route("/roles", get(list_roles))
        .route("/roles/:role/scope", get(get_role_scope))
        .route(
            "/overrides/:role",
            get(get_override).put(write_override).delete(reset_override),
        )
}

fn parse_role(raw: &str) -> AppResult<Role> {
    Ok(raw.parse::<Role>()?)
}

// =============================================================================
// CATALOG
// =============================================================================

/// List every permission with its display label
#[utoipa::path(
    get,
    path = "/rbac/catalog",
    tag = "RBAC",
    responses(
        (status = 200, description = "Permission catalog", body = Vec<CatalogEntry>),
    )
)]
pub async fn list_catalog() -> Json<Vec<CatalogEntry>> {
    Json(Permission::ALL.into_iter().map(CatalogEntry::from).collect())
}

// =============================================================================
// ROLE SCOPES
// =============================================================================

/// Resolved scope of every role, as a session without explicit permissions would see it
#[utoipa::path(
    get,
    path = "/rbac/roles",
    tag = "RBAC",
    responses(
        (status = 200, description = "Scope per role", body = Vec<RoleScope>),
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> AppResult<Json<Vec<RoleScope>>> {
    let mut scopes = Vec::with_capacity(Role::ALL.len());
    for role in Role::ALL {
        scopes.push(resolve_role_scope(&state, role).await);
    }
    Ok(Json(scopes))
}

/// Resolved scope of one role
#[utoipa::path(
    get,
    path = "/rbac/roles/{role}/scope",
    tag = "RBAC",
    params(
        ("role" = String, Path, description = "Usuario, Administrativo, CEO or Desarrollador"),
    ),
    responses(
        (status = 200, description = "Role scope", body = RoleScope),
        (status = 400, description = "Unknown role"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_role_scope(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(role): Path<String>,
) -> AppResult<Json<RoleScope>> {
    let role = parse_role(&role)?;
    Ok(Json(resolve_role_scope(&state, role).await))
}

async fn resolve_role_scope(state: &AppState, role: Role) -> RoleScope {
    let resolution = state.resolver.resolve_with_source(role, &PermissionSet::new()).await;
    RoleScope {
        role,
        source: resolution.source,
        permissions: resolution.permissions.into_iter().collect(),
    }
}

// =============================================================================
// SCOPE OVERRIDES
// =============================================================================

/// Stored override for a role
#[utoipa::path(
    get,
    path = "/rbac/overrides/{role}",
    tag = "RBAC",
    params(
        ("role" = String, Path, description = "Role name"),
    ),
    responses(
        (status = 200, description = "Stored override", body = ScopeOverrideView),
        (status = 404, description = "No override stored for this role"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_override(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(role): Path<String>,
) -> AppResult<Json<ScopeOverrideView>> {
    let role = parse_role(&role)?;
    let permissions = state
        .overrides
        .read_override(role)
        .await
        .filter(|scope| !scope.is_empty())
        .ok_or_else(|| AppError::not_found("no override stored for this role"))?;

    Ok(Json(ScopeOverrideView {
        role,
        permissions: permissions.into_iter().collect(),
    }))
}

/// Replace a role's scope (super-role only)
#[utoipa::path(
    put,
    path = "/rbac/overrides/{role}",
    tag = "RBAC",
    params(
        ("role" = String, Path, description = "Role name"),
    ),
    request_body = OverrideWriteRequest,
    responses(
        (status = 200, description = "Override stored", body = ScopeOverrideView),
        (status = 400, description = "Unknown role or permission identifier"),
        (status = 403, description = "Acting role is not the super-role"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn write_override(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    headers: HeaderMap,
    Path(role): Path<String>,
    Json(req): Json<OverrideWriteRequest>,
) -> AppResult<Json<ScopeOverrideView>> {
    let role = parse_role(&role)?;
    let permissions = parse_permissions(&req.permissions)?;
    let previous = state.overrides.read_override(role).await;

    state
        .overrides
        .write_override(role, &permissions, session.role)
        .await?;

    let change = ScopeOverrideChange::new(role, session.role, &permissions);
    let old = previous.map(|prev| ScopeOverrideChange::new(role, session.role, &prev));
    log_activity_with_context(
        &state.event_bus,
        "written",
        Some(session.user_id),
        &change,
        old.as_ref(),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(ScopeOverrideView {
        role,
        permissions: permissions.into_iter().collect(),
    }))
}

/// Drop a role's override so it falls back to its default scope (super-role only)
#[utoipa::path(
    delete,
    path = "/rbac/overrides/{role}",
    tag = "RBAC",
    params(
        ("role" = String, Path, description = "Role name"),
    ),
    responses(
        (status = 204, description = "Override reset"),
        (status = 403, description = "Acting role is not the super-role"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn reset_override(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    headers: HeaderMap,
    Path(role): Path<String>,
) -> AppResult<StatusCode> {
    let role = parse_role(&role)?;
    let previous = state.overrides.read_override(role).await;

    state.overrides.reset_override(role, session.role).await?;

    let change = ScopeOverrideChange::new(role, session.role, &PermissionSet::new());
    let old = previous.map(|prev| ScopeOverrideChange::new(role, session.role, &prev));
    log_activity_with_context(
        &state.event_bus,
        "reset",
        Some(session.user_id),
        &change,
        old.as_ref(),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(StatusCode::NO_CONTENT)
}
