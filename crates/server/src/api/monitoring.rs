//! Sensor, dashboard and system health endpoints. All read-only.

use crate::AppResources;
use crate::error::{ErrorBody, OpsError};
use crate::services::realtime::{RealtimeService, Snapshot, SystemHealth};
use crate::services::sensors::{ReadingView, SensorService, SensorView};
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const MONITORING_TAG: &str = "Monitoring";

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorList {
    pub sensors: Vec<SensorView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingList {
    pub readings: Vec<ReadingView>,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(sensors))
        .routes(routes!(readings))
        .routes(routes!(realtime))
        .routes(routes!(system_health))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/sensors",
    tag = MONITORING_TAG,
    operation_id = "List Sensors",
    responses(
        (status = 200, description = "All sensors by name", body = SensorList),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn sensors(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<SensorList>, OpsError> {
    let sensors = SensorService::new(resources.db.clone()).sensors().await?;
    Ok(Json(SensorList { sensors }))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/sensors/readings",
    tag = MONITORING_TAG,
    operation_id = "Recent Sensor Readings",
    summary = "Readings from the last 24 hours, newest first, at most 100",
    responses(
        (status = 200, description = "Recent readings", body = ReadingList),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn readings(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<ReadingList>, OpsError> {
    let readings = SensorService::new(resources.db.clone()).readings().await?;
    Ok(Json(ReadingList { readings }))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/realtime",
    tag = MONITORING_TAG,
    operation_id = "Realtime Snapshot",
    summary = "Dashboard snapshot",
    description = "Active sensors with their latest reading, the ten most severe open alerts, \
                   zones that are not safe, and per-type resource totals.",
    responses(
        (status = 200, description = "Snapshot", body = Snapshot),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn realtime(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<Snapshot>, OpsError> {
    Ok(Json(
        RealtimeService::new(resources.db.clone()).snapshot().await?,
    ))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/system/health",
    tag = MONITORING_TAG,
    operation_id = "System Health",
    summary = "Database latency, sensor coverage and recent alert volume",
    responses(
        (status = 200, description = "System health", body = SystemHealth),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn system_health(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<SystemHealth>, OpsError> {
    Ok(Json(
        RealtimeService::new(resources.db.clone())
            .system_health()
            .await?,
    ))
}
