use sea_orm_migration::prelude::*;

mod m20260101_000010_create_roles;
mod m20260101_000011_create_users;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000010_create_roles::Migration),
            Box::new(m20260101_000011_create_users::Migration),
        ]
    }
}
