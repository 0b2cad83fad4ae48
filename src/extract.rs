use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Session;
use crate::errors::AppError;

/// The caller's restored session, resolved fresh for this request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let session_id = Uuid::parse_str(token.trim())
            .map_err(|_| AppError::unauthorized("malformed session token"))?;

        let session = state
            .sessions
            .restore(session_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("session not found or expired"))?;

        Ok(CurrentSession(session))
    }
}
