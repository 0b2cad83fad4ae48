//! Activity log
//!
//! Authorization-relevant actions (override writes, role switches, session
//! lifecycle) are published on a broadcast bus and persisted by a background
//! listener into `activity_log`, where each row carries
//! `SHA256(prev_hash || payload)`. Publishing never blocks or fails a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub subject: Option<String>,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(name: String, actor_id: Option<Uuid>, subject: Option<String>, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            occurred_at: Utc::now(),
            actor_id,
            subject,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

/// Request context for activity logging (IP, User-Agent)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
            });

        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Self { ip, user_agent }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    #[serde(rename = "new")]
    pub current: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    pub severity: Severity,
}

pub fn log_activity<T: Loggable>(event_bus: &EventBus, action: &str, actor_id: Option<Uuid>, entity: &T) {
    log_activity_with_context(event_bus, action, actor_id, entity, None, None);
}

/// Publish `<entity_type>.<action>` with the entity's current and previous state.
pub fn log_activity_with_context<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
    old_entity: Option<&T>,
    context: Option<RequestContext>,
) {
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        context,
        severity: entity.severity_for_action(action),
    };

    let event = DomainEvent::new(
        format!("{}.{}", T::entity_type(), action),
        actor_id,
        Some(entity.subject()),
        serde_json::to_value(&payload).unwrap_or_default(),
    );

    // No receiver just means nobody is persisting right now.
    let _ = event_bus.send(serde_json::to_value(event).unwrap_or_default());
}

fn describe(name: &str) -> &'static str {
    match name {
        "scope_override.written" => "Scope override written",
        "scope_override.reset" => "Scope override reset",
        "session.opened" => "Session opened",
        "session.role_switched" => "Session role switched",
        "session.closed" => "Session closed",
        _ => "System event",
    }
}

pub async fn start_activity_listener(mut rx: broadcast::Receiver<Value>, pool: SqlitePool) {
    tracing::info!("Activity listener started");
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "activity listener lagged; events dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if let Err(e) = persist_event(&pool, &event).await {
            tracing::error!("Failed to save activity log: {}", e);
        }
    }
}

pub async fn persist_event(pool: &SqlitePool, event: &Value) -> Result<(), sqlx::Error> {
    let name = event.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
    let actor_id = event
        .get("actor_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(|u| u.to_string());
    let subject = event.get("subject").and_then(|v| v.as_str());
    let occurred_at = event
        .get("occurred_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let severity = event
        .get("payload")
        .and_then(|p| p.get("severity"))
        .and_then(|s| s.as_str())
        .unwrap_or(Severity::default().as_str());

    let payload = serde_json::to_string(event).unwrap_or_default();

    let mut tx = pool.begin().await?;

    let prev_hash: Option<String> =
        sqlx::query_scalar("SELECT hash FROM activity_log ORDER BY seq DESC LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;

    let hash = chain_hash(prev_hash.as_deref(), &payload);

    sqlx::query(
        r#"
        INSERT INTO activity_log (id, event_name, description, actor_id, subject, occurred_at, severity, payload, prev_hash, hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(describe(name))
    .bind(&actor_id)
    .bind(subject)
    .bind(occurred_at)
    .bind(severity)
    .bind(&payload)
    .bind(&prev_hash)
    .bind(&hash)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

fn chain_hash(prev_hash: Option<&str>, payload: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(ph) = prev_hash {
        hasher.update(ph.as_bytes());
    }
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the hash chain; returns the sequence number of the first broken row.
pub async fn verify_chain(pool: &SqlitePool) -> Result<Option<i64>, sqlx::Error> {
    let rows = sqlx::query("SELECT seq, payload, prev_hash, hash FROM activity_log ORDER BY seq")
        .fetch_all(pool)
        .await?;

    let mut previous: Option<String> = None;
    for row in rows {
        let seq: i64 = row.get("seq");
        let payload: String = row.get("payload");
        let prev_hash: Option<String> = row.get("prev_hash");
        let hash: String = row.get("hash");

        if prev_hash != previous || chain_hash(prev_hash.as_deref(), &payload) != hash {
            return Ok(Some(seq));
        }
        previous = Some(hash);
    }

    Ok(None)
}
