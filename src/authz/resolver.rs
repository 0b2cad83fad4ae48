use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::catalog::{full_catalog, PermissionSet};
use super::role::Role;
use super::scope::default_scope_for;
use super::store::ScopeOverrideStore;

/// Which step of the chain produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    SuperRole,
    Override,
    Explicit,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub permissions: PermissionSet,
    pub source: ResolutionSource,
}

/// Input to a resolution. An empty explicit set means "no explicit list".
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub role: Role,
    pub explicit: &'a PermissionSet,
}

/// One link in the resolution chain. Returning `None` passes to the next step.
#[async_trait]
pub trait ResolutionStep: Send + Sync {
    fn source(&self) -> ResolutionSource;

    async fn try_resolve(&self, request: &ResolutionRequest<'_>) -> Option<PermissionSet>;
}

/// The super-role always receives the full catalog.
pub struct SuperRoleStep;

#[async_trait]
impl ResolutionStep for SuperRoleStep {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::SuperRole
    }

    async fn try_resolve(&self, request: &ResolutionRequest<'_>) -> Option<PermissionSet> {
        request.role.is_super().then(full_catalog)
    }
}

/// A non-empty persisted override for the overridable role.
pub struct RoleOverrideStep {
    store: ScopeOverrideStore,
}

impl RoleOverrideStep {
    pub fn new(store: ScopeOverrideStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolutionStep for RoleOverrideStep {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Override
    }

    async fn try_resolve(&self, request: &ResolutionRequest<'_>) -> Option<PermissionSet> {
        if !request.role.is_overridable() {
            return None;
        }

        self.store
            .read_override(request.role)
            .await
            .filter(|scope| !scope.is_empty())
    }
}

/// Server-asserted per-user permissions, when any were supplied.
pub struct ExplicitListStep;

#[async_trait]
impl ResolutionStep for ExplicitListStep {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Explicit
    }

    async fn try_resolve(&self, request: &ResolutionRequest<'_>) -> Option<PermissionSet> {
        (!request.explicit.is_empty()).then(|| request.explicit.clone())
    }
}

pub struct DefaultScopeStep;

#[async_trait]
impl ResolutionStep for DefaultScopeStep {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Default
    }

    async fn try_resolve(&self, request: &ResolutionRequest<'_>) -> Option<PermissionSet> {
        Some(default_scope_for(request.role))
    }
}

/// Effective permission resolver.
///
/// Precedence, first match wins:
/// 1. super-role -> full catalog (overrides and explicit lists are ignored)
/// 2. overridable role with a non-empty stored override -> the override
/// 3. non-empty explicit list -> the explicit list
/// 4. default scope for the role
///
/// Overrides are read at every resolution; sessions resolved before an
/// override write keep their set until they are resolved again.
#[derive(Clone)]
pub struct PermissionResolver {
    steps: Arc<Vec<Box<dyn ResolutionStep>>>,
}

impl PermissionResolver {
    pub fn new(store: ScopeOverrideStore) -> Self {
        Self::with_steps(vec![
            Box::new(SuperRoleStep),
            Box::new(RoleOverrideStep::new(store)),
            Box::new(ExplicitListStep),
            Box::new(DefaultScopeStep),
        ])
    }

    pub fn with_steps(steps: Vec<Box<dyn ResolutionStep>>) -> Self {
        Self {
            steps: Arc::new(steps),
        }
    }

    /// The chain order, for diagnostics.
    pub fn precedence(&self) -> Vec<ResolutionSource> {
        self.steps.iter().map(|step| step.source()).collect()
    }

    pub async fn resolve_with_source(&self, role: Role, explicit: &PermissionSet) -> Resolution {
        let request = ResolutionRequest { role, explicit };

        for step in self.steps.iter() {
            if let Some(permissions) = step.try_resolve(&request).await {
                tracing::debug!(
                    role = %role,
                    source = ?step.source(),
                    permissions = permissions.len(),
                    "permissions resolved"
                );
                return Resolution {
                    permissions,
                    source: step.source(),
                };
            }
        }

        // Only reachable with a custom chain lacking a terminal step.
        tracing::warn!(role = %role, "no resolution step matched; granting nothing");
        Resolution {
            permissions: PermissionSet::new(),
            source: ResolutionSource::Default,
        }
    }

    pub async fn resolve(&self, role: Role, explicit: &PermissionSet) -> PermissionSet {
        self.resolve_with_source(role, explicit).await.permissions
    }
}
