//! Evacuation zones, routes and the broadcast message log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EvacuationZones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvacuationZones::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::ZoneId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(EvacuationZones::Name).string().not_null())
                    .col(ColumnDef::new(EvacuationZones::Location).string().not_null())
                    .col(
                        ColumnDef::new(EvacuationZones::Population)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::Evacuated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::Status)
                            .string()
                            .not_null()
                            .default("safe"),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::Priority)
                            .string()
                            .not_null()
                            .default("low"),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvacuationZones::UpdatedAt)
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
                    .name("idx_evacuation_zones_status")
                    .table(EvacuationZones::Table)
                    .col(EvacuationZones::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EvacuationRoutes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvacuationRoutes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvacuationRoutes::RouteId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(EvacuationRoutes::Name).string().not_null())
                    .col(ColumnDef::new(EvacuationRoutes::FromZone).string().not_null())
                    .col(ColumnDef::new(EvacuationRoutes::ToLocation).string().not_null())
                    .col(
                        ColumnDef::new(EvacuationRoutes::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(EvacuationRoutes::Capacity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EvacuationRoutes::CurrentUsage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EvacuationRoutes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvacuationRoutes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Messages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Messages::Type).string().not_null())
                    .col(ColumnDef::new(Messages::Title).string().not_null())
                    .col(ColumnDef::new(Messages::Content).text().not_null())
                    .col(ColumnDef::new(Messages::Channels).string().not_null())
                    .col(
                        ColumnDef::new(Messages::TargetAudience)
                            .string()
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(Messages::Status)
                            .string()
                            .not_null()
                            .default("sent"),
                    )
                    .col(ColumnDef::new(Messages::SentBy).uuid().null())
                    .col(
                        ColumnDef::new(Messages::SentAt)
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
                    .name("idx_messages_sent_at")
                    .table(Messages::Table)
                    .col(Messages::SentAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_messages_sent_at").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EvacuationRoutes::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_evacuation_zones_status").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EvacuationZones::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum EvacuationZones {
    Table,
    Id,
    ZoneId,
    Name,
    Location,
    Population,
    Evacuated,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvacuationRoutes {
    Table,
    Id,
    RouteId,
    Name,
    FromZone,
    ToLocation,
    Status,
    Capacity,
    CurrentUsage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    Type,
    Title,
    Content,
    Channels,
    TargetAudience,
    Status,
    SentBy,
    SentAt,
}
