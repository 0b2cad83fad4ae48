use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{Permission, Role};
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    /// Whether the override store answered; a failure here means overrides are being ignored.
    pub overrides_ok: bool,
    pub catalog_size: usize,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let db_check = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;
    let overrides_ok = state.overrides.try_read_override(Role::OVERRIDABLE).await.is_ok();

    let (db_ok, db_error) = match db_check {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    Ok(Json(HealthResponse {
        status: "ok",
        db_ok,
        db_error,
        overrides_ok,
        catalog_size: Permission::ALL.len(),
    }))
}
