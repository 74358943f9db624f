//! Migration: Create universes table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Universes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Universes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Universes::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Universes::MasterAddresses).text().not_null())
                    .col(
                        ColumnDef::new(Universes::State)
                            .string()
                            .not_null()
                            .default("BEGIN"),
                    )
                    .col(
                        ColumnDef::new(Universes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Universes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_universes_state")
                    .table(Universes::Table)
                    .col(Universes::State)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Universes::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "universes"]
pub enum Universes {
    Table,
    Id,
    Name,
    #[iden = "master_addresses"]
    MasterAddresses,
    State,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
