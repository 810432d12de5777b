use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HistoricalRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoricalRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HistoricalRecords::SourceId).integer().not_null())
                    .col(ColumnDef::new(HistoricalRecords::SourceType).string().not_null())
                    .col(ColumnDef::new(HistoricalRecords::Field).string().not_null())
                    .col(ColumnDef::new(HistoricalRecords::Value).text().null())
                    .col(ColumnDef::new(HistoricalRecords::Action).string().not_null())
                    .col(ColumnDef::new(HistoricalRecords::ModifiedBy).integer().not_null())
                    .col(
                        ColumnDef::new(HistoricalRecords::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_historical_records_source")
                    .table(HistoricalRecords::Table)
                    .col(HistoricalRecords::SourceType)
                    .col(HistoricalRecords::SourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HistoricalRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HistoricalRecords {
    Table,
    Id,
    SourceId,
    SourceType,
    Field,
    Value,
    Action,
    ModifiedBy,
    ModifiedAt,
}
