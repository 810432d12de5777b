use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Db(#[from] DbErr),

    #[error("unknown audit action '{0}'")]
    UnknownAction(String),
}
