use sea_orm_migration::prelude::*;

mod m20260101_000020_create_historical_records;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260101_000020_create_historical_records::Migration)]
    }
}
