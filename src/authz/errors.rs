use thiserror::Error;

use super::role::Role;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("role {acting} may not modify scope overrides")]
    Forbidden { acting: Role },
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("malformed scope override for {role}: {reason}")]
    MalformedOverride { role: Role, reason: String },
    #[error("override storage error: {0}")]
    Storage(String),
}

impl AuthzError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;
