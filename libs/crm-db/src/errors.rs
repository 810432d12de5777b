use sea_orm::DbErr;

use crate::transaction::TxStatus;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid database configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Sea(#[from] DbErr),

    #[error("failed to open transaction: {0}")]
    Begin(DbErr),

    #[error("failed to commit transaction: {0}")]
    Commit(DbErr),

    #[error("transaction is already {0}")]
    Closed(TxStatus),
}

impl DbError {
    /// `true` when the request's transaction could not be opened, committed or
    /// used. These are server faults.
    #[must_use]
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, Self::Begin(_) | Self::Commit(_) | Self::Closed(_))
    }
}
