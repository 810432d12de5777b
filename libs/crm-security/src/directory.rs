//! Directory contracts consumed by the pipeline.
//!
//! The token service needs [`UserLookup`] on refresh, the auth middleware
//! needs [`RoleLookup`] on every protected request, and the login handler
//! needs [`CredentialVerifier`]. Implementations live in the `identity`
//! module; tests substitute in-memory fakes.

use async_trait::async_trait;

/// Role row as seen by the authorization layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub role_id: i32,
    pub name: String,
    pub display_name: String,
    pub company_id: i32,
    pub is_enabled: bool,
}

/// User row as seen by the token layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i32,
    pub company_id: i32,
    pub role_id: i32,
    pub name: String,
    pub is_enabled: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("directory storage error: {0}")]
    Storage(String),
}

impl LookupError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// `GetRole(role_id)`.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// # Errors
    /// `NotFound` when no role has this id, `Storage` when the backing store fails.
    async fn get_role(&self, role_id: i32) -> Result<RoleRecord, LookupError>;
}

/// `GetUser(user_id)`.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// # Errors
    /// `NotFound` when no user has this id, `Storage` when the backing store fails.
    async fn get_user(&self, user_id: i32) -> Result<UserRecord, LookupError>;
}

/// Password check used by `POST /login`.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok(None)` for any credential mismatch (unknown company, unknown
    /// user, wrong password, disabled account) so callers cannot tell them apart.
    ///
    /// # Errors
    /// `Storage` when the backing store fails.
    async fn verify_credentials(
        &self,
        company_id: i32,
        user_name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, LookupError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_entity_and_id() {
        let err = LookupError::not_found("role", 42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "role 42 not found");
    }

    #[test]
    fn storage_error_is_not_not_found() {
        let err = LookupError::Storage("connection reset".to_owned());
        assert!(!err.is_not_found());
    }
}
