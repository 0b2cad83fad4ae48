//! Session endpoints
//!
//! Session open/restore/close, the permission probe used by the UI and the
//! role switch trigger.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use crate::app::AppState;
use crate::authz::has_permission_named;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, log_activity_with_context, RequestContext};
use crate::extract::CurrentSession;
use crate::models::session::{OpenSessionRequest, PermissionCheck, RoleSwitch, SessionView, SwitchRoleRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(open_session))
        .route("/me", get(current_session).delete(close_session))
        .route("/me/permissions/:permission", get(check_permission))
        .route("/me/role", post(switch_role))
}

/// Open a session for a user already authenticated upstream
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "Sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionView),
        (status = 404, description = "User not found"),
    )
)]
pub async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let session = state.sessions.open(req.user_id).await?;
    let view = SessionView::from(&session);
    log_activity(&state.event_bus, "opened", Some(session.user_id), &view);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Restore the current session with freshly resolved permissions
#[utoipa::path(
    get,
    path = "/sessions/me",
    tag = "Sessions",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 401, description = "Missing, unknown or expired session"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn current_session(CurrentSession(session): CurrentSession) -> AppResult<Json<SessionView>> {
    Ok(Json(SessionView::from(&session)))
}

/// Logout
#[utoipa::path(
    delete,
    path = "/sessions/me",
    tag = "Sessions",
    responses((status = 204, description = "Session discarded")),
    security(("bearerAuth" = []))
)]
pub async fn close_session(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<StatusCode> {
    state.sessions.close(session.id).await?;
    tracing::info!(session_id = %session.id, user_id = %session.user_id, "session closed");
    log_activity(&state.event_bus, "closed", Some(session.user_id), &SessionView::from(&session));
    Ok(StatusCode::NO_CONTENT)
}

/// Check one permission for the current session
#[utoipa::path(
    get,
    path = "/sessions/me/permissions/{permission}",
    tag = "Sessions",
    params(
        ("permission" = String, Path, description = "Catalog identifier, e.g. TICKETS_DELETE"),
    ),
    responses((status = 200, description = "Check result", body = PermissionCheck)),
    security(("bearerAuth" = []))
)]
pub async fn check_permission(
    CurrentSession(session): CurrentSession,
    Path(permission): Path<String>,
) -> AppResult<Json<PermissionCheck>> {
    let granted = has_permission_named(Some(&session), &permission);
    Ok(Json(PermissionCheck { permission, granted }))
}

/// Switch the current session to another role
#[utoipa::path(
    post,
    path = "/sessions/me/role",
    tag = "Sessions",
    request_body = SwitchRoleRequest,
    responses(
        (status = 200, description = "Session re-resolved under the new role", body = SessionView),
        (status = 403, description = "Original identity may not switch roles"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn switch_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    headers: HeaderMap,
    Json(req): Json<SwitchRoleRequest>,
) -> AppResult<Json<SessionView>> {
    let switched = state.sessions.switch_role(&session, req.role).await.map_err(|err| {
        if matches!(err, AppError::Forbidden(_)) {
            tracing::warn!(session_id = %session.id, role = %session.role, "role switch denied");
        }
        err
    })?;

    let record = RoleSwitch {
        session_id: switched.id,
        user_id: switched.user_id,
        from: session.role,
        to: switched.role,
        role_original: switched.original_role(),
    };

    log_activity_with_context(
        &state.event_bus,
        "role_switched",
        Some(session.user_id),
        &record,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(SessionView::from(&switched)))
}
