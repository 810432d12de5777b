use sea_orm::{EntityTrait, Set};
use sea_orm_migration::prelude::*;

use crate::infra::storage::entity;
use crate::infra::store::default_rules;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolicyRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolicyRules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PolicyRules::RoleName).string().not_null())
                    .col(ColumnDef::new(PolicyRules::Path).string().not_null())
                    .col(ColumnDef::new(PolicyRules::Method).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_policy_rules_triple")
                    .table(PolicyRules::Table)
                    .col(PolicyRules::RoleName)
                    .col(PolicyRules::Path)
                    .col(PolicyRules::Method)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed with the compiled-in defaults so a fresh database can be administered.
        let seed = default_rules().map_err(|e| DbErr::Custom(e.to_string()))?;
        entity::Entity::insert_many(seed.into_iter().map(|r| entity::ActiveModel {
            role_name: Set(r.subject),
            path: Set(r.object),
            method: Set(r.action),
            ..Default::default()
        }))
        .exec(manager.get_connection())
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolicyRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PolicyRules {
    Table,
    Id,
    RoleName,
    Path,
    Method,
}
