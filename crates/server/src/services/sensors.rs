//! Read-only views over the sensor network.

use crate::entity::{sensor, sensor_reading};
use crate::error::OpsError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

/// How far back the readings listing looks.
pub const READINGS_WINDOW: Duration = Duration::hours(24);
pub const READINGS_LIMIT: u64 = 100;

const UNKNOWN_STATUS: &str = "unknown";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorView {
    pub id: Uuid,
    pub sensor_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub status: String,
    pub battery_level: i32,
}

impl From<sensor::Model> for SensorView {
    fn from(s: sensor::Model) -> Self {
        Self {
            id: s.id,
            sensor_id: s.sensor_id,
            name: s.name,
            kind: s.kind,
            location: s.location,
            status: s.status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            battery_level: s.battery_level.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReadingView {
    #[serde(flatten)]
    pub reading: sensor_reading::Model,
    pub sensor_name: Option<String>,
}

pub struct SensorService {
    db: Arc<DatabaseConnection>,
}

impl SensorService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn sensors(&self) -> Result<Vec<SensorView>, OpsError> {
        let sensors = sensor::Entity::find()
            .order_by_asc(sensor::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(sensors.into_iter().map(SensorView::from).collect())
    }

    /// Readings from the last 24 hours, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn readings(&self) -> Result<Vec<ReadingView>, OpsError> {
        let since = OffsetDateTime::now_utc() - READINGS_WINDOW;
        let rows = sensor_reading::Entity::find()
            .filter(sensor_reading::Column::RecordedAt.gt(since))
            .find_also_related(sensor::Entity)
            .order_by_desc(sensor_reading::Column::RecordedAt)
            .limit(READINGS_LIMIT)
            .all(self.db.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(reading, sensor)| ReadingView {
                reading,
                sensor_name: sensor.map(|s| s.name),
            })
            .collect())
    }
}
