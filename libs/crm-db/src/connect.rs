use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::errors::DbError;

/// Pool tuning for [`connect_db`]. `None` keeps the driver default.
#[derive(Debug, Clone, Default)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub sql_logging: bool,
}

/// Open a pooled connection.
///
/// An in-memory `SQLite` database exists per connection, so its pool is
/// pinned to exactly one connection regardless of `opts`.
///
/// # Errors
/// `Config` for an empty URL, `Sea` when the driver cannot connect.
pub async fn connect_db(url: &str, opts: ConnectOpts) -> Result<DatabaseConnection, DbError> {
    if url.trim().is_empty() {
        return Err(DbError::Config("database url is empty".to_owned()));
    }

    let mut options = ConnectOptions::new(url.to_owned());
    if is_sqlite_memory(url) {
        if opts.max_conns.is_some_and(|n| n != 1) {
            debug!("in-memory sqlite: forcing a single pooled connection");
        }
        options.max_connections(1).min_connections(1);
    } else {
        if let Some(max) = opts.max_conns {
            options.max_connections(max);
        }
        if let Some(min) = opts.min_conns {
            options.min_connections(min);
        }
    }
    if let Some(timeout) = opts.acquire_timeout {
        options.acquire_timeout(timeout);
    }
    options.sqlx_logging(opts.sql_logging);

    let db = Database::connect(options).await?;
    info!(backend = ?db.get_database_backend(), "database connected");
    Ok(db)
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite") && url.contains(":memory:")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn recognizes_memory_urls() {
        assert!(is_sqlite_memory("sqlite::memory:"));
        assert!(is_sqlite_memory("sqlite://:memory:"));
        assert!(!is_sqlite_memory("sqlite://crm.db?mode=rwc"));
        assert!(!is_sqlite_memory("postgres://localhost/crm"));
    }

    #[tokio::test]
    async fn empty_url_is_a_config_error() {
        let err = connect_db("  ", ConnectOpts::default()).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[tokio::test]
    async fn connects_to_memory_sqlite() {
        let db = connect_db("sqlite::memory:", ConnectOpts::default()).await.unwrap();
        db.execute_unprepared("SELECT 1").await.unwrap();
        assert_eq!(db.get_database_backend(), sea_orm::DatabaseBackend::Sqlite);
    }
}
