//! Resource inventory and allocations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Resources::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Resources::Name).string().not_null())
                    .col(ColumnDef::new(Resources::Type).string().not_null())
                    .col(
                        ColumnDef::new(Resources::TotalQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Resources::AvailableQuantity)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Resources::AvailableQuantity).gte(0)),
                    )
                    .col(ColumnDef::new(Resources::Unit).string().not_null())
                    .col(ColumnDef::new(Resources::Location).string().not_null())
                    .col(
                        ColumnDef::new(Resources::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Resources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_resources_type")
                    .table(Resources::Table)
                    .col(Resources::Type)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResourceAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceAllocations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ResourceAllocations::ResourceId).uuid().not_null())
                    .col(ColumnDef::new(ResourceAllocations::Quantity).integer().not_null())
                    .col(ColumnDef::new(ResourceAllocations::Destination).string().not_null())
                    .col(ColumnDef::new(ResourceAllocations::RequestedBy).uuid().null())
                    .col(ColumnDef::new(ResourceAllocations::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(ResourceAllocations::Priority)
                            .string()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(ResourceAllocations::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ResourceAllocations::Justification).text().null())
                    .col(
                        ColumnDef::new(ResourceAllocations::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceAllocations::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ResourceAllocations::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_allocations_resource_id")
                            .from(ResourceAllocations::Table, ResourceAllocations::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_resource_allocations_requested_at")
                    .table(ResourceAllocations::Table)
                    .col(ResourceAllocations::RequestedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_resource_allocations_requested_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceAllocations::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_resources_type").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    Name,
    Type,
    TotalQuantity,
    AvailableQuantity,
    Unit,
    Location,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ResourceAllocations {
    Table,
    Id,
    ResourceId,
    Quantity,
    Destination,
    RequestedBy,
    ApprovedBy,
    Priority,
    Status,
    Justification,
    RequestedAt,
    ApprovedAt,
    DeliveredAt,
}
