//! Migration: Create universe_nodes table

use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_universes::Universes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UniverseNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UniverseNodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UniverseNodes::UniverseId).uuid().not_null())
                    .col(ColumnDef::new(UniverseNodes::NodeIdx).integer().not_null())
                    .col(ColumnDef::new(UniverseNodes::NodeName).string().not_null())
                    .col(ColumnDef::new(UniverseNodes::PrivateIp).string().not_null())
                    .col(ColumnDef::new(UniverseNodes::RpcPort).integer().not_null())
                    .col(ColumnDef::new(UniverseNodes::Status).string().not_null())
                    .col(
                        ColumnDef::new(UniverseNodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UniverseNodes::Table, UniverseNodes::UniverseId)
                            .to(Universes::Table, Universes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_universe_nodes_unique")
                    .table(UniverseNodes::Table)
                    .col(UniverseNodes::UniverseId)
                    .col(UniverseNodes::NodeIdx)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UniverseNodes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "universe_nodes"]
enum UniverseNodes {
    Table,
    Id,
    #[iden = "universe_id"]
    UniverseId,
    #[iden = "node_idx"]
    NodeIdx,
    #[iden = "node_name"]
    NodeName,
    #[iden = "private_ip"]
    PrivateIp,
    #[iden = "rpc_port"]
    RpcPort,
    Status,
    #[iden = "created_at"]
    CreatedAt,
}
