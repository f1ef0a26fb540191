pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users_and_alerts;
mod m20260301_000002_create_evacuation_tables;
mod m20260301_000003_create_resource_tables;
mod m20260301_000004_create_sensor_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users_and_alerts::Migration),
            Box::new(m20260301_000002_create_evacuation_tables::Migration),
            Box::new(m20260301_000003_create_resource_tables::Migration),
            Box::new(m20260301_000004_create_sensor_tables::Migration),
        ]
    }
}
