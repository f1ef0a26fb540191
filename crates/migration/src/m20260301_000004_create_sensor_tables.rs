//! Field sensors and their readings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sensors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sensors::SensorId).string().not_null())
                    .col(ColumnDef::new(Sensors::Name).string().not_null())
                    .col(ColumnDef::new(Sensors::Type).string().not_null())
                    .col(ColumnDef::new(Sensors::Location).string().not_null())
                    .col(ColumnDef::new(Sensors::Status).string().null())
                    .col(ColumnDef::new(Sensors::BatteryLevel).integer().null())
                    .col(
                        ColumnDef::new(Sensors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SensorReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorReadings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorReadings::SensorId).uuid().not_null())
                    .col(ColumnDef::new(SensorReadings::ReadingType).string().not_null())
                    .col(ColumnDef::new(SensorReadings::Value).double().not_null())
                    .col(ColumnDef::new(SensorReadings::Unit).string().not_null())
                    .col(
                        ColumnDef::new(SensorReadings::Status)
                            .string()
                            .not_null()
                            .default("normal"),
                    )
                    .col(
                        ColumnDef::new(SensorReadings::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensor_readings_sensor_id")
                            .from(SensorReadings::Table, SensorReadings::SensorId)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sensor_readings_sensor_recorded")
                    .table(SensorReadings::Table)
                    .col(SensorReadings::SensorId)
                    .col(SensorReadings::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sensor_readings_sensor_recorded")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(SensorReadings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sensors::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Sensors {
    Table,
    Id,
    SensorId,
    Name,
    Type,
    Location,
    Status,
    BatteryLevel,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SensorReadings {
    Table,
    Id,
    SensorId,
    ReadingType,
    Value,
    Unit,
    Status,
    RecordedAt,
}
