use sea_orm_migration::prelude::*;

mod m20260101_000001_create_policy_rules;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260101_000001_create_policy_rules::Migration)]
    }
}
