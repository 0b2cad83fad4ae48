use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{PermissionResolver, ScopeOverrideStore};
use crate::config::SessionTtl;
use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::routes::{health, rbac, sessions};
use crate::sessions::SessionProvider;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub overrides: ScopeOverrideStore,
    pub resolver: PermissionResolver,
    pub sessions: SessionProvider,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, ttl: SessionTtl, event_bus: EventBus) -> Self {
        let overrides = ScopeOverrideStore::sqlite(pool.clone());
        let resolver = PermissionResolver::new(overrides.clone());
        let sessions = SessionProvider::new(pool.clone(), resolver.clone(), ttl);

        Self {
            pool,
            overrides,
            resolver,
            sessions,
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let ttl = SessionTtl::from_env()?;
    tracing::info!(session_ttl_hours = ttl.0.num_hours(), "session ttl configured");
    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    let state = AppState::new(pool, ttl, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/sessions", sessions::routes())
        .nest("/rbac", rbac::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
