#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Database plumbing shared by every module: connecting, running
//! migrations, and the per-request [`TransactionScope`].

pub mod config;
pub mod connect;
pub mod errors;
pub mod migration_runner;
pub mod transaction;

pub use config::DatabaseConfig;
pub use connect::{ConnectOpts, connect_db};
pub use errors::DbError;
pub use transaction::{TransactionScope, TxConn, TxHandle, TxStatus};

// Re-exported so module crates only name one database dependency in their APIs.
pub use sea_orm;
pub use sea_orm_migration;
