use crm_db::DbError;

use crate::domain::rule::PolicyRule;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("policy {0} already exists")]
    AlreadyExists(PolicyRule),

    #[error("policy {0} does not exist")]
    NotFound(PolicyRule),

    #[error("policy store error: {0}")]
    Store(String),

    #[error(transparent)]
    Transaction(#[from] DbError),
}

impl PolicyError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn store(err: impl ToString) -> Self {
        Self::Store(err.to_string())
    }
}
