//! Dashboard snapshot and system health.

use crate::domain::{AlertStatus, ZoneStatus};
use crate::entity::{alert, evacuation_zone, sensor, sensor_reading};
use crate::error::OpsError;
use crate::services::resources::{ResourceService, ResourceTypeSummary};
use crate::services::sensors::SensorView;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Instant;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;

pub const SNAPSHOT_ALERT_LIMIT: usize = 10;

/// Share of active sensors above which the network counts as healthy.
pub const HEALTHY_SENSOR_RATIO: f64 = 0.9;

const ACTIVE_SENSOR_STATUS: &str = "active";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveSensor {
    #[serde(flatten)]
    pub sensor: SensorView,
    pub latest_reading: Option<sensor_reading::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Snapshot {
    pub sensors: Vec<LiveSensor>,
    pub alerts: Vec<alert::Model>,
    /// Zones that are not `safe`, highest priority first
    pub evacuation: Vec<evacuation_zone::Model>,
    pub resources: Vec<ResourceTypeSummary>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Warning,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: HealthLevel,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorHealth {
    pub status: HealthLevel,
    pub active: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemHealth {
    pub database: DatabaseHealth,
    pub sensors: SensorHealth,
    /// Alerts created in the last 24 hours
    pub recent_alerts: u64,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
}

/// `healthy` only when strictly more than 90% of sensors are active. An
/// empty sensor network is a warning.
pub fn sensor_health(active: u64, total: u64) -> HealthLevel {
    if total > 0 && active as f64 / total as f64 > HEALTHY_SENSOR_RATIO {
        HealthLevel::Healthy
    } else {
        HealthLevel::Warning
    }
}

pub struct RealtimeService {
    db: Arc<DatabaseConnection>,
}

impl RealtimeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<Snapshot, OpsError> {
        let db = self.db.as_ref();

        let active_sensors = sensor::Entity::find()
            .filter(sensor::Column::Status.eq(ACTIVE_SENSOR_STATUS))
            .order_by_asc(sensor::Column::Name)
            .all(db)
            .await?;
        let mut sensors = Vec::with_capacity(active_sensors.len());
        for s in active_sensors {
            let latest_reading = sensor_reading::Entity::find()
                .filter(sensor_reading::Column::SensorId.eq(s.id))
                .order_by_desc(sensor_reading::Column::RecordedAt)
                .one(db)
                .await?;
            sensors.push(LiveSensor {
                latest_reading,
                sensor: SensorView::from(s),
            });
        }

        let mut alerts = alert::Entity::find()
            .filter(alert::Column::Status.is_in([
                AlertStatus::Active.as_str(),
                AlertStatus::Monitoring.as_str(),
            ]))
            .order_by_desc(alert::Column::CreatedAt)
            .all(db)
            .await?;
        alerts.sort_by_key(|a| Reverse(a.severity().ok()));
        alerts.truncate(SNAPSHOT_ALERT_LIMIT);

        let mut evacuation = evacuation_zone::Entity::find()
            .filter(evacuation_zone::Column::Status.ne(ZoneStatus::Safe.as_str()))
            .order_by_desc(evacuation_zone::Column::UpdatedAt)
            .all(db)
            .await?;
        evacuation.sort_by_key(|z| Reverse(z.priority().ok()));

        let resources = ResourceService::new(self.db.clone()).type_summary().await?;

        Ok(Snapshot {
            sensors,
            alerts,
            evacuation,
            resources,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn system_health(&self) -> Result<SystemHealth, OpsError> {
        let db = self.db.as_ref();

        let started = Instant::now();
        db.ping().await?;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let total = sensor::Entity::find().count(db).await?;
        let active = sensor::Entity::find()
            .filter(sensor::Column::Status.eq(ACTIVE_SENSOR_STATUS))
            .count(db)
            .await?;

        let since = OffsetDateTime::now_utc() - Duration::hours(24);
        let recent_alerts = alert::Entity::find()
            .filter(alert::Column::CreatedAt.gt(since))
            .count(db)
            .await?;

        Ok(SystemHealth {
            database: DatabaseHealth {
                status: HealthLevel::Healthy,
                response_time_ms,
            },
            sensors: SensorHealth {
                status: sensor_health(active, total),
                active,
                total,
            },
            recent_alerts,
            timestamp: OffsetDateTime::now_utc(),
        })
    }
}
