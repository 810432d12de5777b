use sea_orm::DatabaseConnection;
use sea_orm_migration::{MigrationTrait, MigratorTrait, SchemaManager};
use tracing::info;

use crate::errors::DbError;

/// Apply every pending migration of `M`, recording them in `seaql_migrations`.
///
/// # Errors
/// `Sea` if any migration fails.
pub async fn run_migrations<M: MigratorTrait>(db: &DatabaseConnection) -> Result<(), DbError> {
    let pending = M::get_pending_migrations(db).await?.len();
    M::up(db, None).await?;
    info!(applied = pending, "migrations complete");
    Ok(())
}

/// Apply `migrations` in order without bookkeeping. Intended for throwaway
/// test databases where each module contributes its own migration list.
///
/// # Errors
/// `Sea` if any migration fails.
pub async fn run_migrations_for_testing(
    db: &DatabaseConnection,
    migrations: Vec<Box<dyn MigrationTrait>>,
) -> Result<(), DbError> {
    let manager = SchemaManager::new(db);
    for migration in migrations {
        migration.up(&manager).await?;
    }
    Ok(())
}
