//! Scope Override Store
//!
//! Persists a role-keyed replacement for a role's default scope. The store is
//! keyed by role and never decides which roles may be overridden; that rule
//! belongs to the resolver. Writes are restricted to the super-role.
//!
//! Payloads are JSON arrays of catalog identifiers. A payload that fails to
//! decode is reported as [`AuthzError::MalformedOverride`] by
//! [`ScopeOverrideStore::try_read_override`] and treated as "no override" by
//! [`ScopeOverrideStore::read_override`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use super::catalog::{Permission, PermissionSet};
use super::errors::{AuthzError, AuthzResult};
use super::role::Role;

/// Minimal durable key-value contract backing the override store.
#[async_trait]
pub trait OverrideBackend: Send + Sync {
    async fn get(&self, key: &str) -> AuthzResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> AuthzResult<()>;
}

/// Process-local backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OverrideBackend for MemoryBackend {
    async fn get(&self, key: &str) -> AuthzResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> AuthzResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// One row per role in `scope_overrides`; writes are a single upsert.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OverrideBackend for SqliteBackend {
    async fn get(&self, key: &str) -> AuthzResult<Option<Vec<u8>>> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT payload FROM scope_overrides WHERE role_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(AuthzError::storage)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> AuthzResult<()> {
        sqlx::query(
            r#"
            INSERT INTO scope_overrides (role_key, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(role_key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AuthzError::storage)?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct ScopeOverrideStore {
    backend: Arc<dyn OverrideBackend>,
}

impl ScopeOverrideStore {
    pub fn new(backend: Arc<dyn OverrideBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::new(Arc::new(SqliteBackend::new(pool)))
    }

    pub fn key_for(role: Role) -> String {
        format!("scope_override.{}", role.as_str())
    }

    /// Read the persisted override, surfacing storage and decode failures.
    pub async fn try_read_override(&self, role: Role) -> AuthzResult<Option<PermissionSet>> {
        match self.backend.get(&Self::key_for(role)).await? {
            Some(payload) => decode_payload(role, &payload).map(Some),
            None => Ok(None),
        }
    }

    /// Read the persisted override, failing closed: any error reads as `None`.
    pub async fn read_override(&self, role: Role) -> Option<PermissionSet> {
        match self.try_read_override(role).await {
            Ok(found) => found,
            Err(err @ AuthzError::MalformedOverride { .. }) => {
                tracing::warn!(role = %role, error = %err, "ignoring corrupt scope override");
                None
            }
            Err(err) => {
                tracing::warn!(role = %role, error = %err, "scope override unavailable");
                None
            }
        }
    }

    /// Replace the override for `role`. Only the super-role may write.
    pub async fn write_override(
        &self,
        role: Role,
        permissions: &PermissionSet,
        acting_role: Role,
    ) -> AuthzResult<()> {
        if !acting_role.is_super() {
            tracing::warn!(role = %role, acting_role = %acting_role, "scope override write denied");
            return Err(AuthzError::Forbidden { acting: acting_role });
        }

        let payload = encode_payload(permissions)?;
        self.backend.set(&Self::key_for(role), payload).await?;

        tracing::info!(
            role = %role,
            acting_role = %acting_role,
            permissions = permissions.len(),
            "scope override written"
        );
        Ok(())
    }

    /// Store an empty override; the resolver ignores empty overrides, so the
    /// role falls back to its default scope.
    pub async fn reset_override(&self, role: Role, acting_role: Role) -> AuthzResult<()> {
        self.write_override(role, &PermissionSet::new(), acting_role).await
    }
}

fn encode_payload(permissions: &PermissionSet) -> AuthzResult<Vec<u8>> {
    let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
    serde_json::to_vec(&names).map_err(AuthzError::storage)
}

fn decode_payload(role: Role, payload: &[u8]) -> AuthzResult<PermissionSet> {
    let de = &mut serde_json::Deserializer::from_slice(payload);
    let permissions: Vec<Permission> =
        serde_path_to_error::deserialize(de).map_err(|err| AuthzError::MalformedOverride {
            role,
            reason: format!("{} at {}", err.inner(), err.path()),
        })?;

    Ok(permissions.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl OverrideBackend for FailingBackend {
        async fn get(&self, _key: &str) -> AuthzResult<Option<Vec<u8>>> {
            Err(AuthzError::storage("connection refused"))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> AuthzResult<()> {
            Err(AuthzError::storage("connection refused"))
        }
    }

    fn security_pair() -> PermissionSet {
        PermissionSet::from([Permission::ViewSecurity, Permission::SecurityManageUsers])
    }

    #[tokio::test]
    async fn missing_override_reads_as_none() {
        let store = ScopeOverrideStore::in_memory();
        assert_eq!(store.read_override(Role::Administrativo).await, None);
    }

    #[tokio::test]
    async fn super_role_write_roundtrips() {
        let store = ScopeOverrideStore::in_memory();
        store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap();

        assert_eq!(store.read_override(Role::Administrativo).await, Some(security_pair()));
    }

    #[tokio::test]
    async fn store_is_keyed_by_role_not_restricted_to_one() {
        let store = ScopeOverrideStore::in_memory();
        let scope = PermissionSet::from([Permission::ViewReports]);
        store.write_override(Role::Ceo, &scope, Role::Desarrollador).await.unwrap();

        assert_eq!(store.read_override(Role::Ceo).await, Some(scope));
        assert_eq!(store.read_override(Role::Administrativo).await, None);
    }

    #[tokio::test]
    async fn non_super_write_is_forbidden_and_leaves_store_unchanged() {
        let store = ScopeOverrideStore::in_memory();
        store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap();

        for acting in [Role::Usuario, Role::Administrativo, Role::Ceo] {
            let err = store
                .write_override(Role::Administrativo, &PermissionSet::new(), acting)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthzError::Forbidden { acting: a } if a == acting));
        }

        assert_eq!(store.read_override(Role::Administrativo).await, Some(security_pair()));
    }

    #[tokio::test]
    async fn later_write_replaces_earlier_one() {
        let store = ScopeOverrideStore::in_memory();
        store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap();
        let second = PermissionSet::from([Permission::ViewDashboard]);
        store
            .write_override(Role::Administrativo, &second, Role::Desarrollador)
            .await
            .unwrap();

        assert_eq!(store.read_override(Role::Administrativo).await, Some(second));
    }

    #[tokio::test]
    async fn payload_is_a_json_array_of_identifiers() {
        let backend = Arc::new(MemoryBackend::new());
        let store = ScopeOverrideStore::new(backend.clone());
        store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap();

        let raw = backend
            .get(&ScopeOverrideStore::key_for(Role::Administrativo))
            .await
            .unwrap()
            .unwrap();
        let names: Vec<String> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(names, vec!["VIEW_SECURITY", "SECURITY_MANAGE_USERS"]);
    }

    #[tokio::test]
    async fn corrupt_payload_fails_closed() {
        let backend = Arc::new(MemoryBackend::new());
        let key = ScopeOverrideStore::key_for(Role::Administrativo);
        backend.set(&key, b"{not json".to_vec()).await.unwrap();

        let store = ScopeOverrideStore::new(backend);
        assert!(matches!(
            store.try_read_override(Role::Administrativo).await,
            Err(AuthzError::MalformedOverride { .. })
        ));
        assert_eq!(store.read_override(Role::Administrativo).await, None);
    }

    #[tokio::test]
    async fn payload_with_retired_identifier_is_malformed() {
        let backend = Arc::new(MemoryBackend::new());
        let key = ScopeOverrideStore::key_for(Role::Administrativo);
        backend
            .set(&key, br#"["VIEW_SECURITY","LEGACY_EXPORT"]"#.to_vec())
            .await
            .unwrap();

        let store = ScopeOverrideStore::new(backend);
        let err = store.try_read_override(Role::Administrativo).await.unwrap_err();
        assert!(err.to_string().contains("[1]"), "unexpected reason: {err}");
        assert_eq!(store.read_override(Role::Administrativo).await, None);
    }

    #[tokio::test]
    async fn storage_failure_reads_as_none_but_write_surfaces() {
        let store = ScopeOverrideStore::new(Arc::new(FailingBackend));
        assert_eq!(store.read_override(Role::Administrativo).await, None);

        let err = store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Storage(_)));
    }

    #[tokio::test]
    async fn reset_stores_an_empty_override() {
        let store = ScopeOverrideStore::in_memory();
        store
            .write_override(Role::Administrativo, &security_pair(), Role::Desarrollador)
            .await
            .unwrap();
        store.reset_override(Role::Administrativo, Role::Desarrollador).await.unwrap();

        assert_eq!(store.read_override(Role::Administrativo).await, Some(PermissionSet::new()));
        assert!(store.reset_override(Role::Administrativo, Role::Ceo).await.is_err());
    }
}
