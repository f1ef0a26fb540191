use crate::domain::{Priority, ZoneStatus};
use crate::error::OpsError;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "evacuation_zones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable zone code, e.g. `DT-01`
    #[sea_orm(unique)]
    pub zone_id: String,
    pub name: String,
    pub location: String,
    pub population: i32,
    pub evacuated: i32,
    pub status: String,
    pub priority: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<ZoneStatus, OpsError> {
        self.status.parse()
    }

    pub fn priority(&self) -> Result<Priority, OpsError> {
        self.priority.parse()
    }
}
