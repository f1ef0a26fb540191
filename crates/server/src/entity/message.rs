//! Broadcast log. Rows are written once and never updated.

use crate::domain::{Channel, parse_channels};
use crate::error::OpsError;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: String, // "emergency_alert", "evacuation_order", "general"
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Space-separated channel list, e.g. `mobile radio tv`
    pub channels: String,
    pub target_audience: String,
    pub status: String,
    pub sent_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn channel_list(&self) -> Result<Vec<Channel>, OpsError> {
        parse_channels(&self.channels)
    }
}
